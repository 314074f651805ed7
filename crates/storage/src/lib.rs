#![forbid(unsafe_code)]

pub mod bundled;
pub mod repository;
pub mod sqlite;

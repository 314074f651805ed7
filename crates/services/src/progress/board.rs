use std::collections::HashMap;

use learnaid_core::model::{CourseId, ProgressSnapshot};

use crate::epoch::{LoadTicket, RequestEpoch};

/// State of a one-shot request such as a reflection save or feedback send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Dashboard state: one server snapshot per course plus request flags.
///
/// Each course has its own request epoch, so refreshing two courses at once
/// is fine, but an older response for the same course never wins.
#[derive(Debug, Default)]
pub struct ProgressBoard {
    snapshots: HashMap<CourseId, ProgressSnapshot>,
    epochs: HashMap<CourseId, RequestEpoch>,
    in_flight: usize,
    error: Option<String>,
    quote: Option<&'static str>,
    reflection_status: RequestStatus,
    feedback_status: RequestStatus,
}

impl ProgressBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self, course_id: &CourseId) -> LoadTicket {
        self.in_flight += 1;
        self.error = None;
        self.epochs.entry(course_id.clone()).or_default().issue()
    }

    /// Stores a fetched snapshot, replacing the previous one wholesale.
    pub fn apply_snapshot(
        &mut self,
        course_id: &CourseId,
        ticket: LoadTicket,
        snapshot: ProgressSnapshot,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        if !self.is_current(course_id, ticket) {
            return false;
        }
        self.snapshots.insert(course_id.clone(), snapshot);
        true
    }

    /// Records a failed fetch and shows a zeroed snapshot in its place.
    pub fn fail_fetch(
        &mut self,
        course_id: &CourseId,
        ticket: LoadTicket,
        message: impl Into<String>,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        if !self.is_current(course_id, ticket) {
            return false;
        }
        self.error = Some(message.into());
        self.snapshots
            .insert(course_id.clone(), ProgressSnapshot::empty());
        true
    }

    fn is_current(&self, course_id: &CourseId, ticket: LoadTicket) -> bool {
        self.epochs
            .get(course_id)
            .is_some_and(|epoch| epoch.is_current(ticket))
    }

    #[must_use]
    pub fn snapshot(&self, course_id: &CourseId) -> Option<&ProgressSnapshot> {
        self.snapshots.get(course_id)
    }

    pub(crate) fn snapshot_mut(&mut self, course_id: &CourseId) -> Option<&mut ProgressSnapshot> {
        self.snapshots.get_mut(course_id)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn quote(&self) -> Option<&'static str> {
        self.quote
    }

    pub(crate) fn set_quote(&mut self, quote: &'static str) {
        self.quote = Some(quote);
    }

    #[must_use]
    pub fn reflection_status(&self) -> RequestStatus {
        self.reflection_status
    }

    pub(crate) fn set_reflection_status(&mut self, status: RequestStatus) {
        self.reflection_status = status;
    }

    #[must_use]
    pub fn feedback_status(&self) -> RequestStatus {
        self.feedback_status
    }

    pub(crate) fn set_feedback_status(&mut self, status: RequestStatus) {
        self.feedback_status = status;
    }

    /// Forgets every snapshot and invalidates in-flight fetches.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        for epoch in self.epochs.values_mut() {
            epoch.invalidate();
        }
        self.in_flight = 0;
        self.error = None;
        self.reflection_status = RequestStatus::Idle;
        self.feedback_status = RequestStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnaid_core::model::Percent;

    fn at(percent: u8) -> ProgressSnapshot {
        ProgressSnapshot {
            percent_complete: Percent::new(percent).unwrap(),
            ..ProgressSnapshot::empty()
        }
    }

    #[test]
    fn older_response_for_same_course_is_dropped() {
        let course = CourseId::new("c1");
        let mut board = ProgressBoard::new();
        let first = board.begin_fetch(&course);
        let second = board.begin_fetch(&course);
        assert!(board.is_loading());

        assert!(board.apply_snapshot(&course, second, at(40)));
        assert!(!board.apply_snapshot(&course, first, at(10)));
        assert!(!board.is_loading());
        assert_eq!(board.snapshot(&course).unwrap().percent_complete.value(), 40);
    }

    #[test]
    fn courses_refresh_independently() {
        let (a, b) = (CourseId::new("a"), CourseId::new("b"));
        let mut board = ProgressBoard::new();
        let ta = board.begin_fetch(&a);
        let tb = board.begin_fetch(&b);
        assert!(board.apply_snapshot(&b, tb, at(20)));
        assert!(board.apply_snapshot(&a, ta, at(80)));
        assert_eq!(board.snapshot(&a).unwrap().percent_complete.value(), 80);
    }

    #[test]
    fn failure_shows_zeroed_snapshot() {
        let course = CourseId::new("c1");
        let mut board = ProgressBoard::new();
        let ticket = board.begin_fetch(&course);
        board.fail_fetch(&course, ticket, "offline");
        assert_eq!(board.snapshot(&course), Some(&ProgressSnapshot::empty()));
        assert_eq!(board.error(), Some("offline"));
    }

    #[test]
    fn clear_discards_in_flight_fetch() {
        let course = CourseId::new("c1");
        let mut board = ProgressBoard::new();
        let ticket = board.begin_fetch(&course);
        board.clear();
        assert!(!board.apply_snapshot(&course, ticket, at(50)));
        assert!(board.snapshot(&course).is_none());
    }
}

use rand::Rng;
use rand::seq::IndexedRandom;

/// Motivational lines shown on the progress dashboard.
pub const QUOTES: &[&str] = &[
    "Every step you take today prepares you to help someone tomorrow.",
    "Calm hands come from practiced minds.",
    "Knowledge is the first responder's best equipment.",
    "Small lessons, repeated often, save lives.",
    "You don't have to be perfect to make a difference, just prepared.",
    "Confidence grows one practiced skill at a time.",
];

/// Picks one quote uniformly at random.
pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    QUOTES.choose(rng).copied().unwrap_or(QUOTES[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn pick_returns_known_non_empty_quote() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let quote = pick(&mut rng);
            assert!(!quote.is_empty());
            assert!(QUOTES.contains(&quote));
        }
    }
}

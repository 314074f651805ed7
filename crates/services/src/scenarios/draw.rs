use learnaid_core::model::Scenario;
use rand::Rng;
use rand::seq::SliceRandom;

/// Draws up to `n` distinct scenarios from `pool` in random order.
///
/// The pool is copied and shuffled with an unbiased Fisher-Yates pass, then
/// truncated, so every scenario appears at most once per draw.
pub fn draw<R: Rng + ?Sized>(pool: &[Scenario], n: usize, rng: &mut R) -> Vec<Scenario> {
    let mut drawn = pool.to_vec();
    drawn.shuffle(rng);
    drawn.truncate(n);
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnaid_core::model::ScenarioId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn pool(n: usize) -> Vec<Scenario> {
        (0..n)
            .map(|i| Scenario {
                id: ScenarioId::new(format!("sc-{i}")),
                prompt: format!("Situation {i}"),
                options: vec!["Act".into(), "Wait".into()],
                correct_option: "Act".into(),
                explanation: "Acting early helps.".into(),
                image: None,
            })
            .collect()
    }

    fn ids(drawn: &[Scenario]) -> Vec<ScenarioId> {
        drawn.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn draws_distinct_members_of_the_pool() {
        let pool = pool(12);
        let known: HashSet<_> = ids(&pool).into_iter().collect();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let drawn = draw(&pool, 5, &mut rng);
            let unique: HashSet<_> = ids(&drawn).into_iter().collect();
            assert_eq!(drawn.len(), 5);
            assert_eq!(unique.len(), 5);
            assert!(unique.is_subset(&known));
        }
    }

    #[test]
    fn successive_draws_differ() {
        let pool = pool(12);
        let mut rng = StdRng::seed_from_u64(7);
        let first = ids(&draw(&pool, 5, &mut rng));
        let differs = (0..10).any(|_| ids(&draw(&pool, 5, &mut rng)) != first);
        assert!(differs);
    }

    #[test]
    fn short_pool_returns_everything() {
        let pool = pool(3);
        let mut rng = StdRng::seed_from_u64(1);
        let mut drawn = ids(&draw(&pool, 5, &mut rng));
        drawn.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(drawn, ids(&pool));
    }
}

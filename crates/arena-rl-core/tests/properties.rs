use arena_rl_core::{reward_to_go, ActionLog, ArenaAction, ACTION_LOG_LEN};
use proptest::prelude::*;

fn action_strategy() -> impl Strategy<Value = ArenaAction> {
    (0..ArenaAction::COUNT).prop_map(|i| ArenaAction::ALL[i])
}

proptest! {
    #[test]
    fn reward_to_go_satisfies_recurrence(
        rewards in prop::collection::vec(-100.0f64..100.0, 1..64),
        discount in 0.0f64..=1.0,
    ) {
        let g = reward_to_go(&rewards, discount);
        let n = rewards.len();
        prop_assert_eq!(g.len(), n);
        prop_assert!((g[n - 1] - rewards[n - 1]).abs() < 1e-9);
        for i in 0..n - 1 {
            let expected = rewards[i] + discount * g[i + 1];
            prop_assert!((g[i] - expected).abs() < 1e-6 * (1.0 + expected.abs()));
        }
    }

    #[test]
    fn reward_to_go_splits_at_episode_end(
        rewards in prop::collection::vec(-10.0f64..10.0, 1..32),
        tail in prop::collection::vec(-10.0f64..10.0, 1..8),
        discount in 0.0f64..=1.0,
    ) {
        let n = rewards.len();
        let mut extended = rewards.clone();
        extended.extend(tail);
        let short = reward_to_go(&rewards, discount);
        let long = reward_to_go(&extended, discount);
        for i in 0..n {
            let carried = discount.powi(i32::try_from(n - i).unwrap()) * long[n];
            prop_assert!((long[i] - (short[i] + carried)).abs() < 1e-6 * (1.0 + long[i].abs()));
        }
    }

    #[test]
    fn action_log_holds_last_twenty(actions in prop::collection::vec(action_strategy(), 20..80)) {
        let mut log = ActionLog::new();
        for &a in &actions {
            log.push(a);
        }
        let tail: Vec<_> = actions[actions.len() - ACTION_LOG_LEN..].iter().copied().map(Some).collect();
        prop_assert_eq!(log.len(), ACTION_LOG_LEN);
        prop_assert_eq!(log.iter().collect::<Vec<_>>(), tail);
    }
}

//! Configuration types.

/// Gate policy for a single round: what the previous round must show
/// before this one may begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPolicy {
    /// The round being requested (2 or 3 in the default policy).
    pub round: u8,
    /// Minimum score of the previous round.
    pub min_previous_score: u8,
    /// Minimum hours elapsed since the previous round completed.
    pub min_hours_elapsed: i64,
}

/// Round-gate configuration. Policy thresholds are data, not constants;
/// tests substitute their own.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub policies: Vec<RoundPolicy>,
    /// Highest round a prospect can reach.
    pub max_rounds: u8,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            policies: vec![
                RoundPolicy {
                    round: 2,
                    min_previous_score: 60,
                    min_hours_elapsed: 48,
                },
                RoundPolicy {
                    round: 3,
                    min_previous_score: 55,
                    min_hours_elapsed: 72,
                },
            ],
            max_rounds: 3,
        }
    }
}

impl GateConfig {
    /// Policy for a requested round. Round 1 has no policy.
    pub fn policy_for(&self, round: u8) -> Option<&RoundPolicy> {
        self.policies.iter().find(|p| p.round == round)
    }

    /// Build from environment, falling back to the default policy.
    ///
    /// `YENTA_ROUND<N>_MIN_SCORE` / `YENTA_ROUND<N>_MIN_HOURS` override the
    /// per-round thresholds.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for policy in &mut config.policies {
            if let Some(score) = env_u8(&format!("YENTA_ROUND{}_MIN_SCORE", policy.round)) {
                policy.min_previous_score = score;
            }
            if let Some(hours) = env_i64(&format!("YENTA_ROUND{}_MIN_HOURS", policy.round)) {
                policy.min_hours_elapsed = hours;
            }
        }
        config
    }
}

fn env_u8(key: &str) -> Option<u8> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_round_requirements() {
        let config = GateConfig::default();
        assert_eq!(config.max_rounds, 3);

        let r2 = config.policy_for(2).unwrap();
        assert_eq!(r2.min_previous_score, 60);
        assert_eq!(r2.min_hours_elapsed, 48);

        let r3 = config.policy_for(3).unwrap();
        assert_eq!(r3.min_previous_score, 55);
        assert_eq!(r3.min_hours_elapsed, 72);
    }

    #[test]
    fn round_one_has_no_policy() {
        let config = GateConfig::default();
        assert!(config.policy_for(1).is_none());
    }

    #[test]
    fn unknown_round_has_no_policy() {
        let config = GateConfig::default();
        assert!(config.policy_for(4).is_none());
    }
}

//! Coordination Configuration
//!
//! Process-wide settings consumed by the task dispatch core:
//! - **Default task timeout**: bound applied to a distributed operation whose
//!   task did not declare an explicit positive timeout.
//! - **Write quorum**: minimum success count for `QuorumType::WriteQuorum` tasks.
//!
//! Timeout values accept either a bare integer (milliseconds) or a
//! humantime-suffixed string (`500ms`, `5s`, `2m`, `1h`, `7d`, `1w`, `1y`).

use std::time::Duration;

use crate::error::{CoordinationError, Result};

const ENV_TASK_TIMEOUT: &str = "COORD_TASK_TIMEOUT";
const ENV_WRITE_QUORUM: &str = "COORD_WRITE_QUORUM";
const ENV_LOCK_FANOUT: &str = "COORD_LOCK_FANOUT";

const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_WRITE_QUORUM: usize = 2;

/// Which nodes receive a lock task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockFanout {
    /// Only the designated lock manager server (the single authority).
    ManagerOnly,
    /// Every reachable cluster member.
    AllOnline,
}

#[derive(Debug, Clone)]
pub struct CoordinationConfig {
    /// Fallback bound for tasks reporting no explicit positive timeout.
    pub default_task_timeout: Duration,
    /// Minimum number of successful nodes for write-quorum tasks.
    pub write_quorum: usize,
    /// Target set for lock acquire/release tasks.
    pub lock_fanout: LockFanout,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            default_task_timeout: DEFAULT_TASK_TIMEOUT,
            write_quorum: DEFAULT_WRITE_QUORUM,
            lock_fanout: LockFanout::ManagerOnly,
        }
    }
}

impl CoordinationConfig {
    /// Builds the configuration from environment variables, falling back to
    /// defaults for anything unset. Set values that fail to parse are rejected
    /// rather than silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_TASK_TIMEOUT) {
            config.default_task_timeout = parse_duration(&raw)?;
        }

        if let Ok(raw) = std::env::var(ENV_WRITE_QUORUM) {
            config.write_quorum = raw.trim().parse().map_err(|_| {
                CoordinationError::Config(format!("{ENV_WRITE_QUORUM}: expected an integer, got '{raw}'"))
            })?;
        }

        if let Ok(raw) = std::env::var(ENV_LOCK_FANOUT) {
            config.lock_fanout = match raw.trim() {
                "manager" => LockFanout::ManagerOnly,
                "all" => LockFanout::AllOnline,
                other => {
                    return Err(CoordinationError::Config(format!(
                        "{ENV_LOCK_FANOUT}: expected 'manager' or 'all', got '{other}'"
                    )))
                }
            };
        }

        tracing::debug!(
            timeout = ?config.default_task_timeout,
            write_quorum = config.write_quorum,
            "Coordination configuration loaded"
        );

        Ok(config)
    }
}

/// Parses a configured duration. A bare integer is treated as milliseconds;
/// anything else is delegated to the suffixed humantime grammar.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();

    if let Ok(ms) = trimmed.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }

    humantime::parse_duration(trimmed)
        .map_err(|e| CoordinationError::Config(format!("invalid duration '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_integer_is_milliseconds() {
        assert_eq!(parse_duration("5000").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn suffixed_values_parse() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(2 * 86_400));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(7 * 86_400));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("5 parsecs").is_err());
    }

    #[test]
    fn defaults_are_sane() {
        let config = CoordinationConfig::default();
        assert_eq!(config.default_task_timeout, Duration::from_secs(10));
        assert_eq!(config.write_quorum, 2);
    }
}

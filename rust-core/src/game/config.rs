use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::DEFAULT_BOARD_SIZE;
use super::card::DECK_SIZE;

const DEFAULT_DURATION_SECS: u32 = 120;
const DEFAULT_FEEDBACK_MS: u32 = 1_500;
pub const DEFAULT_HISTORY_KEY: &str = "scores";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum ConfigError {
    #[error("session duration must be positive")]
    ZeroDuration,
    #[error("board size {size} is outside 3..={max}")]
    BoardSize { size: usize, max: usize },
    #[error("history key must not be empty")]
    EmptyHistoryKey,
    #[error("{field} must not be negative, got {value}")]
    NegativeScoring { field: String, value: i32 },
}

/// 一局游戏的可调参数，默认值即标准规则。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub duration_secs: u32,
    pub board_size: usize,
    pub match_reward: i32,
    pub no_match_reward: i32,
    pub no_match_penalty: i32,
    pub history_key: String,
    pub feedback_ms: u32,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if !(3..=DECK_SIZE).contains(&self.board_size) {
            return Err(ConfigError::BoardSize {
                size: self.board_size,
                max: DECK_SIZE,
            });
        }
        if self.history_key.trim().is_empty() {
            return Err(ConfigError::EmptyHistoryKey);
        }
        let scoring = [
            ("match_reward", self.match_reward),
            ("no_match_reward", self.no_match_reward),
            ("no_match_penalty", self.no_match_penalty),
        ];
        if let Some(&(field, value)) = scoring.iter().find(|(_, value)| *value < 0) {
            return Err(ConfigError::NegativeScoring {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            board_size: DEFAULT_BOARD_SIZE,
            match_reward: 1,
            no_match_reward: 5,
            no_match_penalty: 2,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            feedback_ms: DEFAULT_FEEDBACK_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_rules() {
        let config = SessionConfig::default();
        assert_eq!(config.duration_secs, 120);
        assert_eq!(config.board_size, 12);
        assert_eq!(
            (config.match_reward, config.no_match_reward, config.no_match_penalty),
            (1, 5, 2)
        );
        assert_eq!(config.history_key, "scores");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"duration_secs": 60}"#).expect("config parses");
        assert_eq!(config.duration_secs, 60);
        assert_eq!(config.board_size, 12);
        assert_eq!(config.feedback_ms, 1_500);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert_eq!(
            SessionConfig::default().with_duration(0).validate(),
            Err(ConfigError::ZeroDuration)
        );
        let tiny = SessionConfig {
            board_size: 2,
            ..SessionConfig::default()
        };
        assert_eq!(
            tiny.validate(),
            Err(ConfigError::BoardSize { size: 2, max: 81 })
        );
        let unnamed = SessionConfig {
            history_key: " ".into(),
            ..SessionConfig::default()
        };
        assert_eq!(unnamed.validate(), Err(ConfigError::EmptyHistoryKey));
    }

    #[test]
    fn validate_rejects_negative_scoring() {
        let generous: SessionConfig =
            serde_json::from_str(r#"{"no_match_penalty": -3}"#).expect("config parses");
        assert_eq!(
            generous.validate(),
            Err(ConfigError::NegativeScoring {
                field: "no_match_penalty".into(),
                value: -3
            })
        );
        let stingy = SessionConfig {
            match_reward: -1,
            ..SessionConfig::default()
        };
        assert!(matches!(
            stingy.validate(),
            Err(ConfigError::NegativeScoring { value: -1, .. })
        ));
        let huge: SessionConfig =
            serde_json::from_str(r#"{"no_match_penalty": 2147483647}"#).expect("config parses");
        assert!(huge.validate().is_ok());
    }
}

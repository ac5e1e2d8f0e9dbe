use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::preferences::validate_decay;
use crate::scoring::ScoringWeights;
use crate::storage::settings;
use crate::{Error, Result};

/// Longest recency window accepted, about a century.
pub const MAX_RECENCY_WINDOW_DAYS: i64 = 36_500;

/// Static digest configuration. Runtime settings in the store may
/// override `digest_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub digest_size: usize,
    pub recency_window_days: i64,
    pub decay_rate: f64,
    pub decay_floor: f64,
    pub boost_amount: f64,
    pub scoring: ScoringWeights,
    pub positive_reaction: String,
    /// Candidates requested per digest slot.
    pub fetch_multiplier: usize,
    pub max_content_chars: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            digest_size: 10,
            recency_window_days: 7,
            decay_rate: 0.05,
            decay_floor: 0.1,
            boost_amount: 0.5,
            scoring: ScoringWeights::default(),
            positive_reaction: "👍".to_string(),
            fetch_multiplier: 2,
            max_content_chars: 8000,
        }
    }
}

impl DigestConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: DigestConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_decay(self.decay_rate, self.decay_floor)?;

        if self.digest_size == 0 {
            return Err(Error::Config("digest_size must be at least 1".to_string()));
        }
        if self.fetch_multiplier == 0 {
            return Err(Error::Config("fetch_multiplier must be at least 1".to_string()));
        }
        if !(0..=MAX_RECENCY_WINDOW_DAYS).contains(&self.recency_window_days) {
            return Err(Error::Config(format!(
                "recency_window_days must be between 0 and {}, got {}",
                MAX_RECENCY_WINDOW_DAYS, self.recency_window_days
            )));
        }
        if self.boost_amount < 0.0 {
            return Err(Error::Config("boost_amount must not be negative".to_string()));
        }
        let ScoringWeights { alpha, beta } = self.scoring;
        if alpha < 0.0 || beta < 0.0 || alpha + beta == 0.0 {
            return Err(Error::Config(format!(
                "scoring weights must be non-negative and not both zero (alpha={}, beta={})",
                alpha, beta
            )));
        }
        if self.positive_reaction.trim().is_empty() {
            return Err(Error::Config("positive_reaction must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn recency_window(&self) -> Result<Duration> {
        Duration::try_days(self.recency_window_days)
            .ok_or_else(|| Error::Config(format!("recency_window_days out of range: {}", self.recency_window_days)))
    }

    pub fn candidate_limit(&self, digest_size: usize) -> usize {
        digest_size.saturating_mul(self.fetch_multiplier)
    }
}

/// Parse a `HH:MM` time of day (UTC).
pub fn parse_daily_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| Error::Config(format!("Invalid schedule time '{}' (expected HH:MM): {}", value, e)))
}

/// Reject values for well-known setting keys that the pipeline could not
/// use. Unknown keys are accepted as-is.
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    match key {
        settings::DIGEST_SIZE => match value.trim().parse::<usize>() {
            Ok(size) if size > 0 => Ok(()),
            _ => Err(Error::Config(format!("digest_size must be a positive integer, got '{}'", value))),
        },
        settings::SCHEDULE_TIME => parse_daily_time(value).map(|_| ()),
        settings::CHAT_ID if value.trim().is_empty() => Err(Error::Config("chat_id must not be empty".to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = DigestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.candidate_limit(10), 20);
        assert_eq!(config.recency_window().unwrap(), Duration::days(7));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DigestConfig::from_toml(
            r#"
            digest_size = 5
            decay_rate = 0.1

            [scoring]
            alpha = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.digest_size, 5);
        assert_eq!(config.decay_rate, 0.1);
        assert_eq!(config.scoring.alpha, 0.5);
        assert_eq!(config.scoring.beta, 0.3);
        assert_eq!(config.positive_reaction, "👍");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(DigestConfig::from_toml("decay_rate = 1.0").is_err());
        assert!(DigestConfig::from_toml("decay_floor = 0.0").is_err());
        assert!(DigestConfig::from_toml("digest_size = 0").is_err());
        assert!(DigestConfig::from_toml("[scoring]\nalpha = 0.0\nbeta = 0.0").is_err());
        assert!(DigestConfig::from_toml("digest_size = \"ten\"").is_err());
        assert!(DigestConfig::from_toml("recency_window_days = -1").is_err());
    }

    #[test]
    fn test_huge_recency_window_is_rejected() {
        assert!(matches!(
            DigestConfig::from_toml("recency_window_days = 200000000"),
            Err(Error::Config(_))
        ));
        assert!(DigestConfig::from_toml("recency_window_days = 36500").is_ok());

        let unchecked = DigestConfig {
            recency_window_days: i64::MAX,
            ..DigestConfig::default()
        };
        assert!(matches!(unchecked.recency_window(), Err(Error::Config(_))));
    }

    #[test]
    fn test_settings_validation() {
        assert!(validate_setting("digest_size", "5").is_ok());
        assert!(validate_setting("digest_size", "0").is_err());
        assert!(validate_setting("schedule_time", "07:30").is_ok());
        assert!(validate_setting("schedule_time", "25:00").is_err());
        assert!(validate_setting("chat_id", " ").is_err());
        assert!(validate_setting("theme", "").is_ok());

        assert_eq!(parse_daily_time(" 08:05 ").unwrap(), NaiveTime::from_hms_opt(8, 5, 0).unwrap());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "boost_amount = 2.0").unwrap();

        let config = DigestConfig::from_file(file.path()).unwrap();
        assert_eq!(config.boost_amount, 2.0);
    }
}

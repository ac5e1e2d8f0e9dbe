//! Tag-weight arithmetic shared by every store backend.

use crate::types::TagWeight;
use crate::{Error, Result};

/// Weight an unseen tag is assumed to have.
pub const BASELINE_WEIGHT: f64 = 1.0;

pub fn decayed_weight(weight: f64, rate: f64, floor: f64) -> f64 {
    (weight * (1.0 - rate)).max(floor)
}

/// Rate must lie in `[0, 1)` and the floor must be positive.
pub fn validate_decay(rate: f64, floor: f64) -> Result<()> {
    if !(0.0..1.0).contains(&rate) {
        return Err(Error::Config(format!("decay rate must be in [0, 1), got {}", rate)));
    }
    if !(floor > 0.0) {
        return Err(Error::Config(format!("decay floor must be positive, got {}", floor)));
    }
    Ok(())
}

impl TagWeight {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            weight: BASELINE_WEIGHT,
            occurrences: 0,
        }
    }

    pub fn boost(&mut self, amount: f64) {
        self.weight += amount;
        self.occurrences += 1;
    }

    pub fn decay(&mut self, rate: f64, floor: f64) {
        self.weight = decayed_weight(self.weight, rate, floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_applies_rate_then_floor() {
        assert!((decayed_weight(2.0, 0.1, 0.5) - 1.8).abs() < 1e-12);
        assert_eq!(decayed_weight(0.6, 0.5, 0.5), 0.5);
        assert_eq!(decayed_weight(0.0, 0.2, 0.1), 0.1);
        assert_eq!(decayed_weight(3.0, 0.0, 0.1), 3.0);
    }

    #[test]
    fn test_iterated_decay_never_drops_below_floor() {
        let mut weight = TagWeight::new("rust");
        weight.boost(4.0);
        for _ in 0..500 {
            weight.decay(0.3, 0.25);
            assert!(weight.weight >= 0.25);
        }
        assert_eq!(weight.weight, 0.25);
    }

    #[test]
    fn test_boost_unseen_tag_starts_from_baseline() {
        let mut weight = TagWeight::new("go");
        weight.boost(0.5);
        assert_eq!(weight.weight, 1.5);
        assert_eq!(weight.occurrences, 1);

        weight.boost(0.5);
        weight.boost(0.25);
        assert_eq!(weight.weight, 2.25);
        assert_eq!(weight.occurrences, 3);
    }

    #[test]
    fn test_validate_decay() {
        assert!(validate_decay(0.0, 0.1).is_ok());
        assert!(validate_decay(0.99, 0.1).is_ok());
        assert!(validate_decay(1.0, 0.1).is_err());
        assert!(validate_decay(-0.1, 0.1).is_err());
        assert!(validate_decay(0.1, 0.0).is_err());
        assert!(validate_decay(0.1, f64::NAN).is_err());
    }
}

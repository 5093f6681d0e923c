//! Analyzer configuration.
//!
//! By default every scan uses the alarm limits recorded in the flight itself.
//! An [`AnalyzerConfig`] can override single limits, pick the fuel unit used
//! for reporting and define the fuel-flow tiers.
//!
//! With the `json` feature the configuration can be read from a JSON
//! document; every field is optional:
//!
//! ```
//! # #[cfg(feature = "json")]
//! # fn main() -> edm_rs::Result<()> {
//! use edm_rs::{AnalyzerConfig, FuelUnit};
//!
//! let config = AnalyzerConfig::from_json(r#"{ "limits": { "cht": 400 }, "fuel_unit": "lph" }"#)?;
//! assert_eq!(config.limits.cht, Some(400));
//! assert_eq!(config.fuel_unit, Some(FuelUnit::Lph));
//! assert_eq!(config.fuel_flow_tiers.thresholds, vec![5.0, 10.0, 15.0]);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "json"))]
//! # fn main() {}
//! ```

use crate::{Error, Result, blocks::AlarmLimits, units::FuelUnit};

/// Settings for [`TimeSeriesAnalyzer`](crate::TimeSeriesAnalyzer).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalyzerConfig {
    /// Limits that replace the flight's own alarm limits.
    pub limits: LimitOverrides,
    /// Unit used when reporting fuel values; `None` keeps the file's unit.
    pub fuel_unit: Option<FuelUnit>,
    pub fuel_flow_tiers: FuelFlowTiers,
}

/// Optional replacements for single alarm limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LimitOverrides {
    /// CHT high limit, °F.
    pub cht: Option<i32>,
    /// Oil temperature low limit, °F.
    pub oil_low: Option<i32>,
    /// Oil temperature high limit, °F.
    pub oil_high: Option<i32>,
    /// Cooling rate limit, °F per minute.
    pub cooling: Option<i32>,
    /// EGT spread limit, °F.
    pub egt_spread: Option<i32>,
}

/// Ascending fuel-flow tier boundaries.
///
/// A sample belongs to tier `n` when it exceeds `thresholds[n - 1]` but not
/// `thresholds[n]`; tier 0 (at or below the first threshold) is never
/// reported.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FuelFlowTiers {
    /// Unit the thresholds are expressed in.
    pub unit: FuelUnit,
    pub thresholds: Vec<f64>,
}

impl Default for FuelFlowTiers {
    fn default() -> Self {
        Self {
            unit: FuelUnit::Gph,
            thresholds: vec![5.0, 10.0, 15.0],
        }
    }
}

impl FuelFlowTiers {
    /// Tier of a fuel-flow value expressed in `self.unit`.
    pub fn tier(&self, value: f64) -> usize {
        self.thresholds.iter().take_while(|&&t| value > t).count()
    }
}

/// Alarm limits after applying overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveLimits {
    pub cht: i32,
    pub oil_low: i32,
    pub oil_high: i32,
    pub cooling: i32,
    pub egt_spread: i32,
}

impl LimitOverrides {
    /// Merge these overrides over a flight's recorded limits.
    pub fn apply(&self, recorded: &AlarmLimits) -> EffectiveLimits {
        EffectiveLimits {
            cht: self.cht.unwrap_or(recorded.cht),
            oil_low: self.oil_low.unwrap_or(recorded.oil_low),
            oil_high: self.oil_high.unwrap_or(recorded.oil_high),
            cooling: self.cooling.unwrap_or(recorded.cooling),
            egt_spread: self.egt_spread.unwrap_or(recorded.egt_spread),
        }
    }
}

impl AnalyzerConfig {
    /// Check that the configuration can be used.
    ///
    /// Tier thresholds must be finite, positive and strictly ascending.
    pub fn validate(&self) -> Result<()> {
        let t = &self.fuel_flow_tiers.thresholds;
        if t.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(Error::InvalidConfig(
                "fuel flow tier thresholds must be positive".into(),
            ));
        }
        if t.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfig(
                "fuel flow tier thresholds must be strictly ascending".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    #[cfg(feature = "json")]
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_limits() {
        let recorded = AlarmLimits::default();
        let overrides = LimitOverrides {
            cht: Some(400),
            ..Default::default()
        };
        let eff = overrides.apply(&recorded);
        assert_eq!(eff.cht, 400);
        assert_eq!(eff.oil_high, recorded.oil_high);
        assert_eq!(eff.oil_low, recorded.oil_low);
        assert_eq!(eff.cooling, recorded.cooling);
        assert_eq!(eff.egt_spread, recorded.egt_spread);
    }

    #[test]
    fn tiers() {
        let tiers = FuelFlowTiers::default();
        assert_eq!(tiers.tier(0.0), 0);
        assert_eq!(tiers.tier(5.0), 0);
        assert_eq!(tiers.tier(5.1), 1);
        assert_eq!(tiers.tier(12.0), 2);
        assert_eq!(tiers.tier(40.0), 3);
    }

    #[test]
    fn validation() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        let mut config = AnalyzerConfig::default();
        config.fuel_flow_tiers.thresholds = vec![10.0, 5.0];
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        config.fuel_flow_tiers.thresholds = vec![-1.0];
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_with_defaults() {
        let config = AnalyzerConfig::from_json("{}").unwrap();
        assert_eq!(config, AnalyzerConfig::default());

        let text = r#"{"fuel_flow_tiers": {"unit": "lph", "thresholds": [20, 40]}}"#;
        let config = AnalyzerConfig::from_json(text).unwrap();
        assert_eq!(config.fuel_flow_tiers.unit, FuelUnit::Lph);
        assert_eq!(config.fuel_flow_tiers.thresholds, vec![20.0, 40.0]);

        let descending = r#"{"fuel_flow_tiers": {"thresholds": [9, 3]}}"#;
        assert!(AnalyzerConfig::from_json(descending).is_err());
    }
}

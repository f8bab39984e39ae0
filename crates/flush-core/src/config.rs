//! Block creation parameters and their validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How per-block durations and weights are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    /// Every block gets the configured means unchanged.
    #[default]
    Const,
    /// Durations are Poisson draws, weights are Normal draws.
    Random,
}

/// Shape of the per-flush yield decay and of the growth curve within a flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayMode {
    /// Flushes yield 3/6, 2/6, 1/6 of the lifetime cap, grown linearly.
    #[default]
    Linear,
    /// Flushes yield geometrically smaller shares, grown along a saturating curve.
    Exponential,
}

/// Errors raised for invalid block or simulation configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Simulation mode string not recognized.
    #[error("simulation mode `{0}` not recognized, select one of {{const, random}}")]
    UnknownSimulationMode(String),
    /// Yield decay mode string not recognized.
    #[error("yield decay mode `{0}` not recognized, select one of {{linear, exponential}}")]
    UnknownDecayMode(String),
    /// Mean durations must be finite and at least one week.
    #[error("{name} must be a finite value >= 1, got {value}")]
    InvalidDuration { name: &'static str, value: f64 },
    /// Probabilities must lie within [0, 1].
    #[error("{name} must be within [0,1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    /// Weights, factors and deviations must be finite and non-negative.
    #[error("{name} must be a finite non-negative value, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    /// A sampling distribution rejected its parameters.
    #[error("cannot build {distribution} distribution: {reason}")]
    Distribution {
        distribution: &'static str,
        reason: String,
    },
}

impl FromStr for SimulationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "const" => Ok(Self::Const),
            "random" => Ok(Self::Random),
            other => Err(ConfigError::UnknownSimulationMode(other.to_string())),
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Const => "const",
            Self::Random => "random",
        })
    }
}

impl FromStr for DecayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            other => Err(ConfigError::UnknownDecayMode(other.to_string())),
        }
    }
}

impl fmt::Display for DecayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Linear => "linear",
            Self::Exponential => "exponential",
        })
    }
}

/// Parameters every new block is created from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Sampling mode for durations and lifetime yield.
    pub simulation_mode: SimulationMode,
    /// Growth/decay policy.
    pub yield_decay_mode: DecayMode,
    /// Substrate mass per block in grams.
    pub bag_weight: f64,
    /// Lifetime yield cap as a multiple of `bag_weight`.
    pub max_lifetime_factor: f64,
    /// Standard deviation of the lifetime yield cap in random mode (grams).
    pub lifetime_yield_std: f64,
    /// Mean weeks until colonization completes.
    pub mean_t_colonization: f64,
    /// Mean weeks a flush takes to reach full weight.
    pub mean_t_fruiting: f64,
    /// Probability that a block is infected by the end of colonization.
    pub p_infection: f64,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            simulation_mode: SimulationMode::Const,
            yield_decay_mode: DecayMode::Linear,
            bag_weight: 1000.0,
            max_lifetime_factor: 0.25,
            lifetime_yield_std: 0.0,
            mean_t_colonization: 4.0,
            mean_t_fruiting: 2.0,
            p_infection: 0.25,
        }
    }
}

impl BlockConfig {
    /// Mean lifetime yield cap in grams.
    pub fn mean_lifetime_yield(&self) -> f64 {
        self.max_lifetime_factor * self.bag_weight
    }

    /// Check every field; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_weight("bag_weight", self.bag_weight)?;
        validate_weight("max_lifetime_factor", self.max_lifetime_factor)?;
        validate_weight("lifetime_yield_std", self.lifetime_yield_std)?;
        validate_duration("mean_t_colonization", self.mean_t_colonization)?;
        validate_duration("mean_t_fruiting", self.mean_t_fruiting)?;
        validate_probability("p_infection", self.p_infection)?;
        Ok(())
    }
}

/// Validate a mean duration in weeks.
pub fn validate_duration(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 1.0 {
        return Err(ConfigError::InvalidDuration { name, value });
    }
    Ok(())
}

/// Validate a probability.
pub fn validate_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidProbability { name, value });
    }
    Ok(())
}

/// Validate a weight, factor or standard deviation.
pub fn validate_weight(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidWeight { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_parse_and_display() {
        assert_eq!("const".parse::<SimulationMode>(), Ok(SimulationMode::Const));
        assert_eq!("random".parse::<SimulationMode>(), Ok(SimulationMode::Random));
        assert_eq!("linear".parse::<DecayMode>(), Ok(DecayMode::Linear));
        assert_eq!(
            "exponential".parse::<DecayMode>(),
            Ok(DecayMode::Exponential)
        );
        assert_eq!(DecayMode::Exponential.to_string(), "exponential");
        assert_eq!(SimulationMode::Random.to_string(), "random");
    }

    #[test]
    fn unknown_modes_are_rejected() {
        assert_eq!(
            "gamma".parse::<SimulationMode>(),
            Err(ConfigError::UnknownSimulationMode("gamma".into()))
        );
        assert_eq!(
            "cubic".parse::<DecayMode>(),
            Err(ConfigError::UnknownDecayMode("cubic".into()))
        );
    }

    #[test]
    fn unknown_mode_fails_deserialization() {
        let res: Result<BlockConfig, _> =
            serde_json::from_str(r#"{"simulation_mode": "poisson"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let cfg: BlockConfig =
            serde_json::from_str(r#"{"yield_decay_mode": "exponential"}"#).unwrap();
        assert_eq!(cfg.yield_decay_mode, DecayMode::Exponential);
        assert_eq!(cfg.bag_weight, 1000.0);
        assert_eq!(cfg.mean_lifetime_yield(), 250.0);
    }

    #[test]
    fn defaults_are_valid() {
        BlockConfig::default().validate().unwrap();
    }

    #[test]
    fn invalid_fields_are_reported() {
        let cfg = BlockConfig {
            mean_t_colonization: 0.5,
            ..BlockConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidDuration {
                name: "mean_t_colonization",
                ..
            })
        ));

        let cfg = BlockConfig {
            p_infection: 1.5,
            ..BlockConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidProbability { .. })
        ));

        let cfg = BlockConfig {
            bag_weight: f64::NAN,
            ..BlockConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidWeight {
                name: "bag_weight",
                ..
            })
        ));
    }
}

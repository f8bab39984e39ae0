//! Constant or random draws for block durations and weights.

use crate::config::{ConfigError, SimulationMode};
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};

/// Draw a duration in weeks.
///
/// In random mode the draw is `Poisson(mean - 1) + 1`, so a block never gets
/// a zero-length colonization or fruiting period. A mean of exactly one week
/// leaves no room for variation and always yields 1.
pub fn sample_duration<R: Rng + ?Sized>(
    mean: f64,
    mode: SimulationMode,
    rng: &mut R,
) -> Result<f64, ConfigError> {
    match mode {
        SimulationMode::Const => Ok(mean),
        SimulationMode::Random => {
            let lambda = mean - 1.0;
            if lambda <= 0.0 {
                return Ok(1.0);
            }
            let poisson = Poisson::new(lambda).map_err(|e| ConfigError::Distribution {
                distribution: "poisson",
                reason: e.to_string(),
            })?;
            Ok(poisson.sample(rng) + 1.0)
        }
    }
}

/// Draw a weight in grams.
///
/// Random mode draws `Normal(mean, std)`; the caller decides how to treat
/// negative tails.
pub fn sample_weight<R: Rng + ?Sized>(
    mean: f64,
    std: f64,
    mode: SimulationMode,
    rng: &mut R,
) -> Result<f64, ConfigError> {
    match mode {
        SimulationMode::Const => Ok(mean),
        SimulationMode::Random => {
            let normal = Normal::new(mean, std).map_err(|e| ConfigError::Distribution {
                distribution: "normal",
                reason: e.to_string(),
            })?;
            Ok(normal.sample(rng))
        }
    }
}

//! Resolve the run configuration from an optional YAML file and CLI flags.

use anyhow::{Context, Result};
use clap::Args;
use flush_core::{DecayMode, SimulationMode};
use flush_runtime::SimulationConfig;
use std::path::Path;

/// Simulation options. Flags left unset fall back to the config file, then
/// to built-in defaults.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Sampling mode: const or random
    #[arg(long)]
    pub simulation_mode: Option<SimulationMode>,
    /// Yield decay: linear or exponential
    #[arg(long)]
    pub yield_decay_mode: Option<DecayMode>,
    /// Substrate mass per block (g)
    #[arg(long)]
    pub bag_weight: Option<f64>,
    /// Lifetime yield cap as a fraction of bag weight
    #[arg(long)]
    pub max_lifetime_factor: Option<f64>,
    /// Std of the lifetime yield cap in random mode (g)
    #[arg(long)]
    pub lifetime_yield_std: Option<f64>,
    /// Mean colonization time (weeks)
    #[arg(long)]
    pub mean_t_colonization: Option<f64>,
    /// Mean fruiting time per flush (weeks)
    #[arg(long)]
    pub mean_t_fruiting: Option<f64>,
    /// Probability of infection by the end of colonization
    #[arg(long)]
    pub p_infection: Option<f64>,
    #[arg(long)]
    pub replications: Option<u32>,
    #[arg(long)]
    pub weeks: Option<u32>,
    /// Blocks inserted per week
    #[arg(long)]
    pub blocks: Option<usize>,
    /// Population capacity (unbounded when omitted)
    #[arg(long, conflicts_with = "unbounded")]
    pub capacity: Option<usize>,
    /// Lift a capacity set in the config file
    #[arg(long)]
    pub unbounded: bool,
    /// Weeks a flush grows before harvest
    #[arg(long)]
    pub grow_time: Option<f64>,
    /// Retire blocks after this many flushes
    #[arg(long)]
    pub remove_after_flush: Option<u32>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Run replications in parallel (`--parallel false` to turn off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub parallel: Option<bool>,
}

impl Overrides {
    pub fn apply(&self, mut cfg: SimulationConfig) -> SimulationConfig {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = self.$field {
                    cfg.$field = v;
                })*
            };
        }
        set!(
            simulation_mode,
            yield_decay_mode,
            bag_weight,
            max_lifetime_factor,
            lifetime_yield_std,
            mean_t_colonization,
            mean_t_fruiting,
            p_infection,
            replications,
            weeks,
            blocks,
            grow_time,
            remove_after_flush,
            seed,
            parallel,
        );
        if self.capacity.is_some() {
            cfg.capacity = self.capacity;
        }
        if self.unbounded {
            cfg.capacity = None;
        }
        cfg
    }
}

/// Parse a YAML run configuration; missing keys take defaults.
pub fn parse_config(yaml: &str) -> Result<SimulationConfig> {
    let cfg = serde_yaml::from_str(yaml)?;
    Ok(cfg)
}

/// Load the config file if given, then apply command-line overrides.
pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<SimulationConfig> {
    let base = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            parse_config(&text).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => SimulationConfig::default(),
    };
    let cfg = overrides.apply(base);
    cfg.validate()?;
    Ok(cfg)
}

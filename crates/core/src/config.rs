//! The configuration surface consumed by the scheduler.
//!
//! Configuration arrives already structured (the outer input layer is not
//! part of this crate). [`DepletionConfig::from_toml_str`] is provided for
//! tests and small drivers; every path into a config goes through
//! [`DepletionConfig::validate`] before a run starts.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::f64::Power;

use crate::units;

/// Errors detected while reading or validating a [`DepletionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid step type '{0}'")]
    InvalidStepType(String),

    #[error("invalid print interval '{0}' (expected final-only, all, or none)")]
    InvalidPrintInterval(String),

    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("the burnup history has no intervals")]
    EmptyHistory,

    #[error("interval {interval} has zero steps")]
    ZeroSteps { interval: usize },

    #[error("interval {interval} has a non-positive or non-finite span {value}")]
    InvalidSpan { interval: usize, value: f64 },

    #[error("interval {interval} is a decay or activation interval with a burnup span")]
    DecayWithBurnupSpan { interval: usize },

    #[error("interval {interval} has an invalid normalization value {value}")]
    InvalidNormalization { interval: usize, value: f64 },

    #[error("self-iterating equilibrium requires the corrector")]
    SieWithoutCorrector,

    #[error("self-iterating equilibrium requires at least one corrector iteration")]
    ZeroCorrectorIterations,

    #[error("sie_tolerance must be finite and positive, got {0}")]
    InvalidTolerance(f64),

    #[error("mass flow from '{material}' has invalid removal constant {value}")]
    InvalidRemoval { material: String, value: f64 },

    #[error("mass flow refers to unknown material '{0}'")]
    UnknownMaterial(String),
}

/// How an interval advances the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum StepType {
    /// Pure decay; the span is the length of each step.
    DecayStep,
    /// Pure decay; the span is the length of the whole interval.
    DecayTotal,
    /// Irradiation with frozen rates; the span is the length of each step.
    ActivationStep,
    /// Irradiation with frozen rates; the span is the whole interval.
    ActivationTotal,
    /// Coupled transport and depletion; the span is the whole interval.
    Burnup,
}

impl StepType {
    /// Returns `true` for step types that skip the transport solve.
    #[must_use]
    pub fn skips_transport(self) -> bool {
        !matches!(self, Self::Burnup)
    }

    /// Returns `true` if the interval span is given per step.
    #[must_use]
    pub fn span_is_per_step(self) -> bool {
        matches!(self, Self::DecayStep | Self::ActivationStep)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DecayStep => "decay-step",
            Self::DecayTotal => "decay-total",
            Self::ActivationStep => "activation-step",
            Self::ActivationTotal => "activation-total",
            Self::Burnup => "burnup",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decay-step" => Ok(Self::DecayStep),
            "decay-total" => Ok(Self::DecayTotal),
            "activation-step" => Ok(Self::ActivationStep),
            "activation-total" => Ok(Self::ActivationTotal),
            "burnup" => Ok(Self::Burnup),
            other => Err(ConfigError::InvalidStepType(other.to_owned())),
        }
    }
}

impl TryFrom<String> for StepType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which steps produce checkpoint records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum PrintInterval {
    /// Only the end-of-history state.
    FinalOnly,
    /// Every step.
    #[default]
    All,
    /// No checkpoint records at all.
    None,
}

impl FromStr for PrintInterval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "final-only" => Ok(Self::FinalOnly),
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            other => Err(ConfigError::InvalidPrintInterval(other.to_owned())),
        }
    }
}

impl TryFrom<String> for PrintInterval {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Length of an interval, in time or in burnup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntervalSpan {
    /// Days.
    Days(f64),
    /// MWd/kgHM.
    Burnup(f64),
}

impl IntervalSpan {
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::Days(v) | Self::Burnup(v) => v,
        }
    }
}

/// How transport tallies are scaled during an interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    /// Total power (W).
    Power(f64),
    /// Total scalar flux (n/cm²/s).
    Flux(f64),
    /// Source rate (n/s).
    SourceRate(f64),
}

impl Normalization {
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::Power(v) | Self::Flux(v) | Self::SourceRate(v) => v,
        }
    }

    /// The fixed power, for power-normalized intervals.
    #[must_use]
    pub fn power(self) -> Option<Power> {
        match self {
            Self::Power(watts) => Some(units::watts(watts)),
            Self::Flux(_) | Self::SourceRate(_) => None,
        }
    }
}

/// Neutron population of one transport solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    pub particles: u64,
    pub active_cycles: u32,
    pub inactive_cycles: u32,
}

impl Default for Population {
    fn default() -> Self {
        Self {
            particles: 10_000,
            active_cycles: 100,
            inactive_cycles: 20,
        }
    }
}

/// Continuous removal of one element from one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassFlow {
    pub material: String,
    /// Atomic number of the removed element.
    pub element: u16,
    /// Removal constant (s⁻¹).
    pub removal_constant: f64,
}

/// One interval of the burnup history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub step_type: StepType,
    pub span: IntervalSpan,
    pub steps: usize,
    pub normalization: Normalization,
    #[serde(default)]
    pub mass_flows: Vec<MassFlow>,
}

impl Interval {
    /// The span covered by one step, in the span's own unit.
    #[must_use]
    pub fn span_per_step(&self) -> f64 {
        if self.step_type.span_is_per_step() {
            self.span.value()
        } else {
            self.span.value() / self.steps as f64
        }
    }
}

/// Configuration of a depletion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepletionConfig {
    pub intervals: Vec<Interval>,
    #[serde(default = "enabled")]
    pub corrector: bool,
    /// Upper bound on corrector iterations in self-iterating mode.
    #[serde(default = "one")]
    pub max_corrector_iterations: usize,
    /// Self-iterating equilibrium: repeat the corrector until converged.
    #[serde(default)]
    pub sie: bool,
    /// Largest relative density change accepted as converged.
    #[serde(default = "default_sie_tolerance")]
    pub sie_tolerance: f64,
    #[serde(default)]
    pub print_interval: PrintInterval,
    #[serde(default)]
    pub population: Population,
    /// Population for corrector solves; defaults to `population`.
    #[serde(default)]
    pub corrector_population: Option<Population>,
    /// Add newly populated daughters to compositions after each step.
    #[serde(default)]
    pub refresh_inventory: bool,
}

fn enabled() -> bool {
    true
}

fn one() -> usize {
    1
}

fn default_sie_tolerance() -> f64 {
    1.0e-4
}

impl DepletionConfig {
    /// A configuration with the given intervals and default settings.
    #[must_use]
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self {
            intervals,
            corrector: true,
            max_corrector_iterations: 1,
            sie: false,
            sie_tolerance: default_sie_tolerance(),
            print_interval: PrintInterval::default(),
            population: Population::default(),
            corrector_population: None,
            refresh_inventory: false,
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input (including unknown
    /// step types and print intervals) and any validation error.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Population used by corrector solves.
    #[must_use]
    pub fn corrector_population(&self) -> Population {
        self.corrector_population.unwrap_or(self.population)
    }

    /// Checks every setting before any computation starts.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intervals.is_empty() {
            return Err(ConfigError::EmptyHistory);
        }

        for (index, interval) in self.intervals.iter().enumerate() {
            if interval.steps == 0 {
                return Err(ConfigError::ZeroSteps { interval: index });
            }
            let span = interval.span.value();
            if !span.is_finite() || span <= 0.0 {
                return Err(ConfigError::InvalidSpan {
                    interval: index,
                    value: span,
                });
            }
            if interval.step_type.skips_transport()
                && matches!(interval.span, IntervalSpan::Burnup(_))
            {
                return Err(ConfigError::DecayWithBurnupSpan { interval: index });
            }
            let norm = interval.normalization.value();
            if !norm.is_finite() || norm < 0.0 {
                return Err(ConfigError::InvalidNormalization {
                    interval: index,
                    value: norm,
                });
            }
            if let Some(flow) = interval
                .mass_flows
                .iter()
                .find(|f| !f.removal_constant.is_finite() || f.removal_constant < 0.0)
            {
                return Err(ConfigError::InvalidRemoval {
                    material: flow.material.clone(),
                    value: flow.removal_constant,
                });
            }
        }

        if self.sie {
            if !self.corrector {
                return Err(ConfigError::SieWithoutCorrector);
            }
            if self.max_corrector_iterations == 0 {
                return Err(ConfigError::ZeroCorrectorIterations);
            }
            if !self.sie_tolerance.is_finite() || self.sie_tolerance <= 0.0 {
                return Err(ConfigError::InvalidTolerance(self.sie_tolerance));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = r#"
        corrector = false
        print_interval = "final-only"

        [[intervals]]
        step_type = "burnup"
        steps = 3
        span = { burnup = 30.0 }
        normalization = { power = 1.0e6 }

        [[intervals]]
        step_type = "decay-step"
        steps = 2
        span = { days = 10.0 }
        normalization = { power = 0.0 }
    "#;

    #[test]
    fn parses_history_from_toml() {
        let config = DepletionConfig::from_toml_str(HISTORY).unwrap();

        assert!(!config.corrector);
        assert_eq!(config.print_interval, PrintInterval::FinalOnly);
        assert_eq!(config.intervals.len(), 2);
        assert_eq!(config.intervals[0].step_type, StepType::Burnup);
        assert_eq!(config.intervals[0].span_per_step(), 10.0);
        assert_eq!(config.intervals[1].span_per_step(), 10.0);
        assert_eq!(config.corrector_population(), Population::default());
    }

    #[test]
    fn rejects_unknown_step_type() {
        let source = HISTORY.replace("decay-step", "decay-forever");
        assert!(matches!(
            DepletionConfig::from_toml_str(&source),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            "decay-forever".parse::<StepType>(),
            Err(ConfigError::InvalidStepType(s)) if s == "decay-forever"
        ));
    }

    #[test]
    fn rejects_unknown_print_interval() {
        let source = HISTORY.replace("final-only", "sometimes");
        assert!(matches!(
            DepletionConfig::from_toml_str(&source),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            "sometimes".parse::<PrintInterval>(),
            Err(ConfigError::InvalidPrintInterval(_))
        ));
    }

    #[test]
    fn decay_interval_cannot_span_burnup() {
        let source = HISTORY.replace("span = { days = 10.0 }", "span = { burnup = 1.0 }");
        assert!(matches!(
            DepletionConfig::from_toml_str(&source),
            Err(ConfigError::DecayWithBurnupSpan { interval: 1 })
        ));
    }

    #[test]
    fn sie_requires_corrector() {
        let mut config = DepletionConfig::from_toml_str(HISTORY).unwrap();
        config.sie = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SieWithoutCorrector)
        ));

        config.corrector = true;
        config.max_corrector_iterations = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroCorrectorIterations)
        ));
    }

    #[test]
    fn rejects_empty_history_and_zero_steps() {
        assert!(matches!(
            DepletionConfig::new(Vec::new()).validate(),
            Err(ConfigError::EmptyHistory)
        ));

        let mut config = DepletionConfig::from_toml_str(HISTORY).unwrap();
        config.intervals[1].steps = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroSteps { interval: 1 })
        ));
    }
}

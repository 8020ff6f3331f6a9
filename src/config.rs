//! TOML-based scenario configuration and preset definitions.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::network::{LinkSpec, RoutingMode};
use crate::sim::signal::{SignalMode, SignalTiming};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Horizon, step, seed and demand.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Grid topology and link physics.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Signal control mode and timing bounds.
    #[serde(default)]
    pub signals: SignalConfig,
    /// Route assignment at initialization.
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulated horizon in seconds (must be > 0).
    pub duration_s: f64,
    /// Tick length in seconds (must be > 0 and <= `duration_s`).
    pub dt_s: f64,
    /// Master random seed for OD sampling and route generation.
    pub seed: u64,
    /// Number of vehicles released at tick 0 (must be > 0).
    pub vehicles: usize,
    /// Stop the loop once every vehicle has completed.
    pub early_stop: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_s: 10_800.0,
            dt_s: 1.0,
            seed: 42,
            vehicles: 2500,
            early_stop: true,
        }
    }
}

impl SimulationConfig {
    /// Number of ticks in the configured horizon.
    pub fn ticks(&self) -> usize {
        if self.dt_s > 0.0 && self.duration_s > 0.0 {
            (self.duration_s / self.dt_s).floor() as usize
        } else {
            0
        }
    }
}

/// Grid topology and link physics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Intersections per side (must be >= 2).
    pub grid_size: usize,
    /// Distance between adjacent intersections (m).
    pub spacing_m: f64,
    /// Link length used for traversal time (m).
    pub link_length_m: f64,
    /// Posted speed limit on every link (m/s).
    pub speed_limit_mps: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            grid_size: 5,
            spacing_m: 1000.0,
            link_length_m: 500.0,
            speed_limit_mps: 13.9,
        }
    }
}

impl NetworkConfig {
    pub fn link_spec(&self) -> LinkSpec {
        LinkSpec {
            length_m: self.link_length_m,
            speed_limit_mps: self.speed_limit_mps,
        }
    }
}

/// Signal control mode and timing bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalConfig {
    /// `"fixed"` or `"adaptive"`.
    pub mode: SignalMode,
    /// Minimum green time (s).
    pub min_green_s: f64,
    /// Maximum green time (s).
    pub max_green_s: f64,
    /// Yellow clearance (s).
    pub yellow_s: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            mode: SignalMode::Adaptive,
            min_green_s: 15.0,
            max_green_s: 90.0,
            yellow_s: 3.0,
        }
    }
}

impl SignalConfig {
    pub fn timing(&self) -> SignalTiming {
        SignalTiming {
            min_green_s: self.min_green_s,
            max_green_s: self.max_green_s,
            yellow_s: self.yellow_s,
        }
    }
}

/// Route assignment parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// `"shortest"`, `"stochastic-alternate"` or `"mixed"`.
    pub mode: RoutingMode,
    /// Candidate routes per vehicle in mixed mode, A* path included.
    pub alternatives: usize,
    /// Upper bound of the uniform weight jitter in alternate generation.
    pub jitter: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: RoutingMode::Mixed,
            alternatives: 3,
            jitter: 0.3,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"network.grid_size"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error in {}: {}", self.field, self.message)
    }
}

impl Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario: 5×5 grid, 2500 vehicles over three
    /// hours, adaptive signals and mixed routing.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Baseline demand under fixed-time control.
    pub fn fixed_time() -> Self {
        Self {
            signals: SignalConfig {
                mode: SignalMode::Fixed,
                ..SignalConfig::default()
            },
            ..Self::default()
        }
    }

    /// Low demand with every vehicle on its shortest path.
    pub fn light_traffic() -> Self {
        Self {
            simulation: SimulationConfig {
                vehicles: 500,
                ..SimulationConfig::default()
            },
            routing: RoutingConfig {
                mode: RoutingMode::Shortest,
                ..RoutingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "fixed_time", "light_traffic"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "fixed_time" => Ok(Self::fixed_time()),
            "light_traffic" => Ok(Self::light_traffic()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if !(s.duration_s > 0.0) {
            errors.push(ConfigError::new("simulation.duration_s", "must be > 0"));
        }
        if !(s.dt_s > 0.0) {
            errors.push(ConfigError::new("simulation.dt_s", "must be > 0"));
        } else if s.dt_s > s.duration_s {
            errors.push(ConfigError::new(
                "simulation.dt_s",
                "must be <= simulation.duration_s",
            ));
        }
        if s.vehicles == 0 {
            errors.push(ConfigError::new("simulation.vehicles", "must be > 0"));
        }

        let n = &self.network;
        if n.grid_size < 2 {
            errors.push(ConfigError::new("network.grid_size", "must be >= 2"));
        }
        if !(n.spacing_m > 0.0) {
            errors.push(ConfigError::new("network.spacing_m", "must be > 0"));
        }
        if !(n.link_length_m > 0.0) {
            errors.push(ConfigError::new("network.link_length_m", "must be > 0"));
        }
        if !(n.speed_limit_mps > 0.0) {
            errors.push(ConfigError::new("network.speed_limit_mps", "must be > 0"));
        }

        let sig = &self.signals;
        if !(sig.min_green_s > 0.0) {
            errors.push(ConfigError::new("signals.min_green_s", "must be > 0"));
        }
        if !(sig.max_green_s >= sig.min_green_s) {
            errors.push(ConfigError::new(
                "signals.max_green_s",
                "must be >= signals.min_green_s",
            ));
        }
        if !(sig.yellow_s > 0.0) {
            errors.push(ConfigError::new("signals.yellow_s", "must be > 0"));
        }

        let r = &self.routing;
        if r.alternatives == 0 {
            errors.push(ConfigError::new("routing.alternatives", "must be >= 1"));
        }
        if !(r.jitter >= 0.0 && r.jitter.is_finite()) {
            errors.push(ConfigError::new(
                "routing.jitter",
                "must be a finite value >= 0",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
        assert_eq!(cfg.simulation.ticks(), 10_800);
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("rush_hour");
        let e = err.err().map(|e| e.message).unwrap_or_default();
        assert!(e.contains("unknown preset"));
        assert!(e.contains("light_traffic"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn fixed_time_only_changes_signal_mode() {
        let base = ScenarioConfig::baseline();
        let fixed = ScenarioConfig::fixed_time();
        assert_eq!(fixed.signals.mode, SignalMode::Fixed);
        assert_eq!(fixed.simulation.vehicles, base.simulation.vehicles);
        assert_eq!(fixed.routing.mode, base.routing.mode);
    }

    #[test]
    fn light_traffic_has_less_demand() {
        let light = ScenarioConfig::light_traffic();
        assert!(light.simulation.vehicles < ScenarioConfig::baseline().simulation.vehicles);
        assert_eq!(light.routing.mode, RoutingMode::Shortest);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
duration_s = 3600.0
dt_s = 1.0
seed = 7
vehicles = 100
early_stop = false

[network]
grid_size = 4
spacing_m = 800.0
link_length_m = 400.0
speed_limit_mps = 11.1

[signals]
mode = "fixed"
min_green_s = 20.0
max_green_s = 60.0
yellow_s = 4.0

[routing]
mode = "stochastic-alternate"
alternatives = 2
jitter = 0.5
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.network.grid_size), Some(4));
        assert_eq!(cfg.as_ref().map(|c| c.signals.mode), Some(SignalMode::Fixed));
        assert_eq!(
            cfg.as_ref().map(|c| c.routing.mode),
            Some(RoutingMode::StochasticAlternate)
        );
        assert_eq!(cfg.as_ref().map(|c| c.simulation.ticks()), Some(3600));
    }

    #[test]
    fn config_error_names_field_and_message() {
        let e = ConfigError::new("network.grid_size", "must be >= 2");
        assert_eq!(e.to_string(), "config error in network.grid_size: must be >= 2");
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[network]
grid_size = 5
lanes = 2
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_signal_mode_rejected() {
        let toml = r#"
[signals]
mode = "actuated"
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.vehicles), Some(2500));
        assert_eq!(cfg.as_ref().map(|c| c.signals.max_green_s), Some(90.0));
    }

    #[test]
    fn validation_collects_every_violation() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.network.grid_size = 1;
        cfg.simulation.vehicles = 0;
        cfg.signals.max_green_s = 10.0;
        let errors = cfg.validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"network.grid_size"));
        assert!(fields.contains(&"simulation.vehicles"));
        assert!(fields.contains(&"signals.max_green_s"));
    }

    #[test]
    fn validation_catches_step_longer_than_horizon() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.duration_s = 10.0;
        cfg.simulation.dt_s = 20.0;
        assert!(cfg.validate().iter().any(|e| e.field == "simulation.dt_s"));
    }

    #[test]
    fn validation_catches_nan_speed_limit() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.network.speed_limit_mps = f64::NAN;
        assert!(
            cfg.validate()
                .iter()
                .any(|e| e.field == "network.speed_limit_mps")
        );
    }
}

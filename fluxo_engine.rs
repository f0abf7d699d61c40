//! # Fluxo Engine - Analytical Queueing Performance
//!
//! An analytical engine that estimates steady-state performance metrics of
//! queueing systems from closed-form models (M/M/1 and Erlang-C M/M/c), and
//! derives model inputs from observed load data such as daily traffic volumes.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              FLUXO ENGINE                                    │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  VOLUME SERIES → LOAD ESTIMATOR → STABILITY GUARD → QUEUEING MODELS → REPORT │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Closed-Form Models**: M/M/1 and M/M/c steady-state metrics, no simulation
//! - **Stability Aware**: typed rejection of invalid or saturated parameter sets
//! - **Load Derivation**: average-case and peak-case arrival rates from volumes
//! - **Scenario Analysis**: average-period and peak-period metrics in one pass
//! - **Stateless**: every computation is a pure function of its arguments
//!
//! ## Author
//!
//! Fluxo Team - Built with 🔥 and Rust

// ============================================================================
// SECTION 1: IMPORTS & DEPENDENCIES
// ============================================================================
// This section contains all external crate imports organized by functionality.
// We import everything we need upfront for clarity and compile-time optimization.
// ============================================================================

#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(unused_variables)]
#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

// ----------------------------------------------------------------------------
// Standard Library Imports
// ----------------------------------------------------------------------------
use std::fmt::{self, Debug, Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

// ----------------------------------------------------------------------------
// Serialization
// ----------------------------------------------------------------------------
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ----------------------------------------------------------------------------
// Error Handling
// ----------------------------------------------------------------------------
use anyhow::{Context as AnyhowContext, Result as AnyhowResult};
use thiserror::Error;

// ----------------------------------------------------------------------------
// Logging & Tracing
// ----------------------------------------------------------------------------
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ----------------------------------------------------------------------------
// Time & Timestamps
// ----------------------------------------------------------------------------
use chrono::{DateTime, Utc};

// ----------------------------------------------------------------------------
// Statistics & Math
// ----------------------------------------------------------------------------
use ordered_float::OrderedFloat;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

// ----------------------------------------------------------------------------
// CLI
// ----------------------------------------------------------------------------
use clap::{CommandFactory, Parser, Subcommand};

// ============================================================================
// SECTION 2: CONSTANTS & VERSION INFORMATION
// ============================================================================
// Global constants that define the behavior and limits of the engine.
// ============================================================================

/// Engine version - follows semantic versioning
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const ENGINE_NAME: &str = "fluxo-engine";
pub const ENGINE_FULL_NAME: &str = "Fluxo Queueing Engine";

// ----------------------------------------------------------------------------
// Load Estimation
// ----------------------------------------------------------------------------

/// Seconds in one calendar day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Default observation period length used to convert volumes into rates.
/// One row of a volume series is assumed to cover one calendar day.
pub const DEFAULT_PERIOD_SECONDS: f64 = SECONDS_PER_DAY;

/// Default headroom factor applied to the peak arrival rate when suggesting
/// a service rate for what-if analysis
pub const DEFAULT_SERVICE_RATE_HEADROOM: f64 = 2.0;

/// Minimum suggested service rate (req/s)
pub const DEFAULT_SERVICE_RATE_FLOOR: f64 = 1.0;

// ----------------------------------------------------------------------------
// Model Limits
// ----------------------------------------------------------------------------

/// Maximum number of parallel servers accepted by the multi-server model.
/// The partial-sum loop is O(c); this bound keeps a single call effectively
/// instantaneous.
pub const MAX_SERVER_COUNT: u32 = 100_000;

/// Relative tolerance used when checking metric self-consistency
/// (Little's law and the queue/system decompositions)
pub const CONSISTENCY_TOLERANCE: f64 = 1e-9;

// ----------------------------------------------------------------------------
// Saturation Thresholds
// ----------------------------------------------------------------------------

/// Utilization at which a system is considered elevated
pub const DEFAULT_UTILIZATION_WARN: f64 = 0.7;

/// Utilization at which a system is considered critically saturated
pub const DEFAULT_UTILIZATION_CRITICAL: f64 = 0.9;

// ============================================================================
// SECTION 3: CORE TYPE SYSTEM
// ============================================================================
// Plain value types exchanged with the presentation layer. All of them are
// immutable after construction and carry no identity or lifecycle.
// ============================================================================

// ----------------------------------------------------------------------------
// 3.1 Queue Parameters
// ----------------------------------------------------------------------------

/// Input parameters for a queueing model.
///
/// `arrival_rate` (λ) and `service_rate` (μ) are expressed in requests per
/// second; `servers` (c) is the number of identical parallel servers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueParameters {
    /// Arrival rate λ (req/s)
    pub arrival_rate: f64,
    /// Service rate μ per server (req/s)
    pub service_rate: f64,
    /// Number of identical parallel servers c
    pub servers: u32,
}

impl QueueParameters {
    /// Parameters for a single-server (M/M/1) system.
    pub fn single_server(arrival_rate: f64, service_rate: f64) -> Self {
        Self {
            arrival_rate,
            service_rate,
            servers: 1,
        }
    }

    /// Parameters for a multi-server (M/M/c) system.
    pub fn multi_server(arrival_rate: f64, service_rate: f64, servers: u32) -> Self {
        Self {
            arrival_rate,
            service_rate,
            servers,
        }
    }

    /// Offered traffic a = λ/μ, in Erlangs.
    #[inline]
    pub fn offered_load(&self) -> f64 {
        self.arrival_rate / self.service_rate
    }

    /// Aggregate capacity c·μ (req/s).
    #[inline]
    pub fn capacity(&self) -> f64 {
        self.servers as f64 * self.service_rate
    }

    /// Aggregate utilization ρ = λ/(c·μ).
    #[inline]
    pub fn utilization(&self) -> f64 {
        self.arrival_rate / self.capacity()
    }

    /// Check that the parameters describe a stable, well-defined queue.
    ///
    /// Non-finite or non-positive rates and a zero server count are reported
    /// as [`EngineError::InvalidParameters`]; a utilization at or above 1 is
    /// reported as [`EngineError::UnstableSystem`]. The boundary λ == c·μ is
    /// unstable (the queue grows without bound).
    pub fn validate(&self) -> EngineResult<()> {
        if !self.arrival_rate.is_finite() || self.arrival_rate <= 0.0 {
            return Err(EngineError::InvalidParameters {
                message: format!(
                    "arrival rate must be a positive finite number of req/s, got {}",
                    self.arrival_rate
                ),
            });
        }

        if !self.service_rate.is_finite() || self.service_rate <= 0.0 {
            return Err(EngineError::InvalidParameters {
                message: format!(
                    "service rate must be a positive finite number of req/s, got {}",
                    self.service_rate
                ),
            });
        }

        if self.servers == 0 {
            return Err(EngineError::InvalidParameters {
                message: "server count must be at least 1".into(),
            });
        }

        if self.servers > MAX_SERVER_COUNT {
            return Err(EngineError::InvalidParameters {
                message: format!(
                    "server count {} exceeds the supported maximum of {}",
                    self.servers, MAX_SERVER_COUNT
                ),
            });
        }

        if self.arrival_rate >= self.capacity() {
            return Err(EngineError::UnstableSystem {
                offered: self.arrival_rate,
                capacity: self.capacity(),
            });
        }

        Ok(())
    }
}

// ----------------------------------------------------------------------------
// 3.2 Queue Metrics
// ----------------------------------------------------------------------------

/// Steady-state metrics of a stable queueing system.
///
/// Field names on the wire follow the classic queueing-theory notation
/// (`rho`, `L`, `Lq`, `W`, `Wq`, `P0`) expected by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueMetrics {
    /// Utilization ρ, fraction of capacity in use
    #[serde(rename = "rho")]
    pub utilization: f64,
    /// Mean number of requests in the system (queued + in service)
    #[serde(rename = "L")]
    pub mean_in_system: f64,
    /// Mean number of requests waiting in the queue
    #[serde(rename = "Lq")]
    pub mean_in_queue: f64,
    /// Mean time a request spends in the system, in seconds
    #[serde(rename = "W")]
    pub mean_time_in_system: f64,
    /// Mean time a request spends waiting in the queue, in seconds
    #[serde(rename = "Wq")]
    pub mean_time_in_queue: f64,
    /// Steady-state probability that the system is empty.
    /// Only reported by the multi-server model.
    #[serde(rename = "P0", skip_serializing_if = "Option::is_none", default)]
    pub empty_probability: Option<f64>,
}

impl QueueMetrics {
    /// Classify the utilization against the default saturation thresholds.
    pub fn saturation(&self) -> SaturationLevel {
        SaturationLevel::from_utilization(
            self.utilization,
            DEFAULT_UTILIZATION_WARN,
            DEFAULT_UTILIZATION_CRITICAL,
        )
    }

    /// Classify the utilization against explicit thresholds.
    pub fn saturation_with(&self, warn: f64, critical: f64) -> SaturationLevel {
        SaturationLevel::from_utilization(self.utilization, warn, critical)
    }

    /// Check the internal identities of the metric set against the inputs it
    /// was computed from: L = Lq + λ/μ, W = Wq + 1/μ and L = λ·W, all within
    /// [`CONSISTENCY_TOLERANCE`] relative tolerance.
    pub fn is_consistent(&self, arrival_rate: f64, service_rate: f64) -> bool {
        let close = |actual: f64, expected: f64| {
            let scale = expected.abs().max(1.0);
            (actual - expected).abs() <= CONSISTENCY_TOLERANCE * scale
        };

        close(self.mean_in_system, self.mean_in_queue + arrival_rate / service_rate)
            && close(self.mean_time_in_system, self.mean_time_in_queue + 1.0 / service_rate)
            && close(self.mean_in_system, arrival_rate * self.mean_time_in_system)
    }
}

// ----------------------------------------------------------------------------
// 3.3 Saturation Level
// ----------------------------------------------------------------------------

/// Qualitative reading of a utilization value.
///
/// `Critical` means the system operates close to its stability boundary and
/// response times are highly sensitive to additional load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationLevel {
    Normal,
    Elevated,
    Critical,
}

impl SaturationLevel {
    /// Classify a utilization value against the given thresholds.
    pub fn from_utilization(utilization: f64, warn: f64, critical: f64) -> Self {
        if utilization >= critical {
            SaturationLevel::Critical
        } else if utilization >= warn {
            SaturationLevel::Elevated
        } else {
            SaturationLevel::Normal
        }
    }
}

impl Display for SaturationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SaturationLevel::Normal => write!(f, "normal"),
            SaturationLevel::Elevated => write!(f, "elevated"),
            SaturationLevel::Critical => write!(f, "critical"),
        }
    }
}

// ----------------------------------------------------------------------------
// 3.4 Volume Series
// ----------------------------------------------------------------------------

/// A single observation period: an optional timestamp and the traffic volume
/// recorded for that period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeObservation {
    /// Start of the observation period, if known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Total volume recorded over the period
    pub volume: f64,
}

impl VolumeObservation {
    /// Observation without a timestamp.
    pub fn new(volume: f64) -> Self {
        Self {
            timestamp: None,
            volume,
        }
    }

    /// Observation at a known period start.
    pub fn at(timestamp: DateTime<Utc>, volume: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            volume,
        }
    }
}

/// An ordered sequence of per-period volume observations.
///
/// Construction drops rows whose volume is not a finite number, mirroring the
/// cleaning an upstream data loader performs before handing data over.
/// Negative volumes are kept here and rejected later by the estimator, so a
/// bad reading surfaces as an error instead of silently skewing the mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeSeries {
    observations: Vec<VolumeObservation>,
}

impl VolumeSeries {
    /// Build a series from bare volumes, one per period, dropping non-finite
    /// entries.
    pub fn from_volumes<I>(volumes: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::from_observations(volumes.into_iter().map(VolumeObservation::new))
    }

    /// Build a series from timestamped observations, dropping rows with a
    /// non-finite volume.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = VolumeObservation>,
    {
        let observations: Vec<VolumeObservation> = observations
            .into_iter()
            .filter(|obs| obs.volume.is_finite())
            .collect();

        Self { observations }
    }

    /// Number of retained observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True when no observations survived cleaning.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// The retained observations, in input order.
    pub fn observations(&self) -> &[VolumeObservation] {
        &self.observations
    }

    /// The retained volumes, in input order.
    pub fn volumes(&self) -> Vec<f64> {
        self.observations.iter().map(|obs| obs.volume).collect()
    }

    /// Descriptive statistics of the retained volumes.
    pub fn summary(&self) -> EngineResult<VolumeSummary> {
        if self.observations.is_empty() {
            return Err(EngineError::EmptyInput(
                "volume series has no observations".into(),
            ));
        }

        let count = self.observations.len();
        let sum: f64 = self.observations.iter().map(|obs| obs.volume).sum();
        let sum_sq: f64 = self
            .observations
            .iter()
            .map(|obs| obs.volume * obs.volume)
            .sum();
        let mean = sum / count as f64;
        let variance = (sum_sq / count as f64) - (mean * mean);

        let min = self
            .observations
            .iter()
            .map(|obs| OrderedFloat(obs.volume))
            .min()
            .map(OrderedFloat::into_inner)
            .unwrap_or(0.0);
        let max = self
            .observations
            .iter()
            .map(|obs| OrderedFloat(obs.volume))
            .max()
            .map(OrderedFloat::into_inner)
            .unwrap_or(0.0);

        Ok(VolumeSummary {
            count: count as u64,
            mean,
            min,
            max,
            std_dev: variance.sqrt().max(0.0),
        })
    }

    /// Derive a load estimate from this series. See [`estimate_load`].
    pub fn load_estimate(&self, period_seconds: f64) -> EngineResult<LoadEstimate> {
        estimate_load(&self.volumes(), period_seconds)
    }
}

/// A snapshot of descriptive statistics for a volume series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

// ----------------------------------------------------------------------------
// 3.5 Load Estimate
// ----------------------------------------------------------------------------

/// Arrival rates derived from an observed volume series.
///
/// `mean_arrival_rate` describes an average period and `peak_arrival_rate`
/// the busiest one; each feeds a separate model run as the two operating
/// scenarios of interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadEstimate {
    /// Average-case arrival rate λ (req/s)
    pub mean_arrival_rate: f64,
    /// Peak-case arrival rate λ (req/s)
    pub peak_arrival_rate: f64,
    /// Period length, in seconds, used for the conversion
    pub period_seconds: f64,
}

// ----------------------------------------------------------------------------
// 3.6 Scenario Analysis
// ----------------------------------------------------------------------------

/// Full outcome of analyzing a volume series under a given service capacity:
/// the series statistics, the derived load estimate, and steady-state metrics
/// for the average and peak scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    /// Descriptive statistics of the input series
    pub summary: VolumeSummary,
    /// Arrival rates derived from the series
    pub load: LoadEstimate,
    /// Service rate μ the scenarios were computed under (req/s per server)
    pub service_rate: f64,
    /// Server count c the scenarios were computed under
    pub servers: u32,
    /// Metrics for an average period
    pub average: QueueMetrics,
    /// Metrics for the busiest period
    pub peak: QueueMetrics,
}

// ============================================================================
// SECTION 4: ERROR HANDLING FRAMEWORK
// ============================================================================
// Typed errors for every failure the engine can report. Designed for:
// - Clear error categorization (callers and tests assert the specific cause)
// - Easy error propagation with context
// - Human-readable explanations naming the violated condition
// ============================================================================

// ----------------------------------------------------------------------------
// 4.1 Core Engine Errors
// ----------------------------------------------------------------------------

/// The main error type for the Fluxo engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A rate or count does not describe a well-defined queue
    #[error("Invalid queue parameters: {message}")]
    InvalidParameters { message: String },

    /// The parameters describe a queue with no steady state: the offered
    /// load reaches or exceeds the aggregate capacity
    #[error(
        "Unstable system: arrival rate {offered} req/s is at or above \
         the aggregate capacity {capacity} req/s; steady-state metrics do not exist"
    )]
    UnstableSystem { offered: f64, capacity: f64 },

    /// A statistic was requested over an empty observation sequence
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A result record could not be serialized for output
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invariant violation inside the engine itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Check if this error is recoverable by the caller (re-prompt with
    /// different parameters or skip the dependent computation).
    pub fn is_recoverable(&self) -> bool {
        match self {
            EngineError::InvalidParameters { .. } => true,
            EngineError::UnstableSystem { .. } => true,
            EngineError::EmptyInput(_) => true,
            EngineError::Config(_) => false,
            EngineError::Serialization(_) => false,
            EngineError::Internal(_) => false,
        }
    }

    /// Get the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::InvalidParameters { .. } => "invalid_parameters",
            EngineError::UnstableSystem { .. } => "unstable_system",
            EngineError::EmptyInput(_) => "empty_input",
            EngineError::Config(_) => "config",
            EngineError::Serialization(_) => "serialization",
            EngineError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

// ----------------------------------------------------------------------------
// 4.2 Configuration Errors
// ----------------------------------------------------------------------------

/// Errors related to configuration loading and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to parse configuration: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// ============================================================================
// SECTION 5: CONFIGURATION SYSTEM
// ============================================================================
// Configuration management with:
// - TOML file parsing
// - Environment variable overrides
// - Validation
// - Sensible defaults
// ============================================================================

// ----------------------------------------------------------------------------
// 5.1 Main Configuration Structure
// ----------------------------------------------------------------------------

/// Root configuration for the Fluxo engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// General engine settings
    #[serde(default)]
    pub engine: GeneralConfig,

    /// Analysis defaults
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine: GeneralConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file with environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("FLUXO_").split("__"));

        let config: Self = figment.extract().map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load from string (for testing)
    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let analysis = &self.analysis;

        if !analysis.period_seconds.is_finite() || analysis.period_seconds <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.period_seconds".into(),
                message: "Observation period must be a positive number of seconds".into(),
            });
        }

        if !analysis.service_rate_headroom.is_finite() || analysis.service_rate_headroom < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.service_rate_headroom".into(),
                message: "Headroom factor must be at least 1".into(),
            });
        }

        if !analysis.service_rate_floor.is_finite() || analysis.service_rate_floor <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.service_rate_floor".into(),
                message: "Service rate floor must be positive".into(),
            });
        }

        if analysis.utilization_warn <= 0.0
            || analysis.utilization_critical <= analysis.utilization_warn
            || analysis.utilization_critical > 1.0
        {
            return Err(ConfigError::InvalidValue {
                field: "analysis.utilization_warn".into(),
                message: format!(
                    "Saturation thresholds must satisfy 0 < warn < critical <= 1, \
                     got warn={} critical={}",
                    analysis.utilization_warn, analysis.utilization_critical
                ),
            });
        }

        if analysis.max_servers == 0 || analysis.max_servers > MAX_SERVER_COUNT {
            return Err(ConfigError::InvalidValue {
                field: "analysis.max_servers".into(),
                message: format!("Server limit must be between 1 and {}", MAX_SERVER_COUNT),
            });
        }

        Ok(())
    }

    /// Create a default config file
    pub fn generate_default_config() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

// ----------------------------------------------------------------------------
// 5.2 General Engine Configuration
// ----------------------------------------------------------------------------

/// General engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Engine instance name (for identification)
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Environment name (prod, staging, dev)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Enable debug mode
    #[serde(default)]
    pub debug: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            environment: default_environment(),
            debug: false,
        }
    }
}

fn default_instance_name() -> String {
    ENGINE_NAME.into()
}

fn default_environment() -> String {
    "production".into()
}

fn default_true() -> bool {
    true
}

// ----------------------------------------------------------------------------
// 5.3 Analysis Configuration
// ----------------------------------------------------------------------------

/// Defaults applied when deriving load and running scenario analyses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Length of one observation period, in seconds.
    /// One row of a volume series covers one period.
    #[serde(default = "default_period_seconds")]
    pub period_seconds: f64,

    /// Factor applied to the peak arrival rate when suggesting a service rate
    #[serde(default = "default_service_rate_headroom")]
    pub service_rate_headroom: f64,

    /// Minimum suggested service rate (req/s)
    #[serde(default = "default_service_rate_floor")]
    pub service_rate_floor: f64,

    /// Utilization threshold for the elevated saturation level
    #[serde(default = "default_utilization_warn")]
    pub utilization_warn: f64,

    /// Utilization threshold for the critical saturation level
    #[serde(default = "default_utilization_critical")]
    pub utilization_critical: f64,

    /// Upper bound on accepted server counts
    #[serde(default = "default_max_servers")]
    pub max_servers: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            period_seconds: default_period_seconds(),
            service_rate_headroom: default_service_rate_headroom(),
            service_rate_floor: default_service_rate_floor(),
            utilization_warn: default_utilization_warn(),
            utilization_critical: default_utilization_critical(),
            max_servers: default_max_servers(),
        }
    }
}

fn default_period_seconds() -> f64 {
    DEFAULT_PERIOD_SECONDS
}

fn default_service_rate_headroom() -> f64 {
    DEFAULT_SERVICE_RATE_HEADROOM
}

fn default_service_rate_floor() -> f64 {
    DEFAULT_SERVICE_RATE_FLOOR
}

fn default_utilization_warn() -> f64 {
    DEFAULT_UTILIZATION_WARN
}

fn default_utilization_critical() -> f64 {
    DEFAULT_UTILIZATION_CRITICAL
}

fn default_max_servers() -> u32 {
    MAX_SERVER_COUNT
}

// ----------------------------------------------------------------------------
// 5.4 Logging Configuration
// ----------------------------------------------------------------------------

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Enable ANSI colors
    #[serde(default = "default_true")]
    pub colors: bool,

    /// Include source location
    #[serde(default)]
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            colors: true,
            source_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// SECTION 6: LOGGING & TRACING INFRASTRUCTURE
// ============================================================================
// Structured logging with level filtering and multiple output formats.
// ============================================================================

// ----------------------------------------------------------------------------
// 6.1 Log Level Management
// ----------------------------------------------------------------------------

/// Log levels for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

// ----------------------------------------------------------------------------
// 6.2 Logger Initialization
// ----------------------------------------------------------------------------

/// Initialize the logging system based on configuration
pub fn init_logging(config: &LoggingConfig) -> EngineResult<()> {
    let level_filter = match config.level.to_lowercase().as_str() {
        "trace" => tracing::level_filters::LevelFilter::TRACE,
        "debug" => tracing::level_filters::LevelFilter::DEBUG,
        "info" => tracing::level_filters::LevelFilter::INFO,
        "warn" => tracing::level_filters::LevelFilter::WARN,
        "error" => tracing::level_filters::LevelFilter::ERROR,
        _ => tracing::level_filters::LevelFilter::INFO,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    // Build the subscriber based on format
    match config.format.as_str() {
        "json" => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| EngineError::Internal(format!("Failed to set logger: {}", e)))?;
        }
        "compact" => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_ansi(config.colors)
                    .with_target(true),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| EngineError::Internal(format!("Failed to set logger: {}", e)))?;
        }
        _ => {
            // Pretty format (default)
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(config.colors)
                    .with_target(true)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| EngineError::Internal(format!("Failed to set logger: {}", e)))?;
        }
    }

    info!(
        target: "fluxo::init",
        level = %config.level,
        format = %config.format,
        "Logging initialized"
    );

    Ok(())
}

// ============================================================================
// SECTION 7: QUEUEING MODELS
// ============================================================================
// The analytical core: closed-form steady-state metrics for M/M/1 and M/M/c
// systems. Both functions are pure; the stability guard runs before any
// formula that would divide by zero or produce a negative quantity.
// ============================================================================

// ----------------------------------------------------------------------------
// 7.1 Single-Server Model (M/M/1)
// ----------------------------------------------------------------------------

/// Compute steady-state metrics for a single-server M/M/1 queue.
///
/// ```text
/// ρ  = λ / μ
/// L  = ρ / (1 − ρ)
/// Lq = ρ² / (1 − ρ)
/// W  = 1 / (μ − λ)
/// Wq = λ / (μ · (μ − λ))
/// ```
///
/// Fails with [`EngineError::InvalidParameters`] when either rate is
/// non-positive or non-finite, and with [`EngineError::UnstableSystem`] when
/// λ ≥ μ (the boundary λ == μ has no steady state).
///
/// # Examples
///
/// ```
/// use fluxo_engine::mm1_metrics;
///
/// let metrics = mm1_metrics(30.0, 50.0).unwrap();
/// assert!((metrics.utilization - 0.6).abs() < 1e-9);
/// assert!((metrics.mean_time_in_system - 0.05).abs() < 1e-9);
/// ```
pub fn mm1_metrics(arrival_rate: f64, service_rate: f64) -> EngineResult<QueueMetrics> {
    let params = QueueParameters::single_server(arrival_rate, service_rate);
    if let Err(err) = params.validate() {
        debug!(
            target: "fluxo::models",
            arrival_rate,
            service_rate,
            category = err.category(),
            "M/M/1 computation rejected"
        );
        return Err(err);
    }

    let rho = arrival_rate / service_rate;
    let mean_in_system = rho / (1.0 - rho);
    let mean_in_queue = rho * rho / (1.0 - rho);
    let mean_time_in_system = 1.0 / (service_rate - arrival_rate);
    let mean_time_in_queue = arrival_rate / (service_rate * (service_rate - arrival_rate));

    Ok(QueueMetrics {
        utilization: rho,
        mean_in_system,
        mean_in_queue,
        mean_time_in_system,
        mean_time_in_queue,
        empty_probability: None,
    })
}

// ----------------------------------------------------------------------------
// 7.2 Multi-Server Model (M/M/c, Erlang-C)
// ----------------------------------------------------------------------------

/// Compute steady-state metrics for a multi-server M/M/c queue via the
/// Erlang-C formula.
///
/// ```text
/// a   = λ / μ                               offered traffic (Erlangs)
/// ρ   = a / c                               aggregate utilization
/// P0  = 1 / (Σ_{n=0}^{c-1} aⁿ/n!  +  a^c / (c!·(1 − ρ)))
/// Lq  = P0 · a^c · ρ / (c!·(1 − ρ)²)
/// L   = Lq + a
/// Wq  = Lq / λ
/// W   = Wq + 1/μ
/// ```
///
/// The ratio aⁿ/n! is evaluated with an incrementally updated running term
/// (`term ← term · a/n`), so no factorial or power is ever materialized.
/// This keeps the computation exact in double precision for small c and
/// extends the usable range to server counts in the hundreds, where a naive
/// a^c / c! would overflow long before the ratio does.
///
/// With c = 1 the result reduces to the M/M/1 metrics, with the empty-system
/// probability additionally reported.
pub fn mmc_metrics(arrival_rate: f64, service_rate: f64, servers: u32) -> EngineResult<QueueMetrics> {
    let params = QueueParameters::multi_server(arrival_rate, service_rate, servers);
    if let Err(err) = params.validate() {
        debug!(
            target: "fluxo::models",
            arrival_rate,
            service_rate,
            servers,
            category = err.category(),
            "M/M/c computation rejected"
        );
        return Err(err);
    }

    let offered = params.offered_load();
    let rho = params.utilization();

    // Partial sum Σ_{n=0}^{c-1} aⁿ/n! with a running term; after the loop the
    // term holds a^c/c! for the Erlang-C tail.
    let mut sum = 0.0;
    let mut term = 1.0;
    for n in 0..servers {
        sum += term;
        term *= offered / (n as f64 + 1.0);
    }

    let tail = term / (1.0 - rho);
    let empty_probability = 1.0 / (sum + tail);

    let mean_in_queue = empty_probability * term * rho / ((1.0 - rho) * (1.0 - rho));
    let mean_in_system = mean_in_queue + offered;
    let mean_time_in_queue = mean_in_queue / arrival_rate;
    let mean_time_in_system = mean_time_in_queue + 1.0 / service_rate;

    Ok(QueueMetrics {
        utilization: rho,
        mean_in_system,
        mean_in_queue,
        mean_time_in_system,
        mean_time_in_queue,
        empty_probability: Some(empty_probability),
    })
}

// ----------------------------------------------------------------------------
// 7.3 Model Dispatch
// ----------------------------------------------------------------------------

/// Compute steady-state metrics with the model matching the server count:
/// M/M/1 for a single server, M/M/c otherwise.
pub fn queue_metrics(
    arrival_rate: f64,
    service_rate: f64,
    servers: u32,
) -> EngineResult<QueueMetrics> {
    match servers {
        1 => mm1_metrics(arrival_rate, service_rate),
        _ => mmc_metrics(arrival_rate, service_rate, servers),
    }
}

// ============================================================================
// SECTION 8: LOAD ESTIMATION & SCENARIO ANALYSIS
// ============================================================================
// Derivation of model inputs from observed per-period volumes, and the
// two-scenario (average period / peak period) analysis built on top of it.
// ============================================================================

// ----------------------------------------------------------------------------
// 8.1 Arrival Rate Estimation
// ----------------------------------------------------------------------------

/// Convert per-period volume observations into arrival rates.
///
/// `mean_arrival_rate = mean(volumes) / period_seconds` and
/// `peak_arrival_rate = max(volumes) / period_seconds`.
///
/// Fails with [`EngineError::EmptyInput`] on an empty sequence and with
/// [`EngineError::InvalidParameters`] when the period is not positive or a
/// volume is negative or non-finite. Upstream cleaning is expected to have
/// removed bad rows already; a negative volume reaching this point is
/// surfaced instead of silently skewing the statistics.
///
/// For all-non-negative input, `peak_arrival_rate >= mean_arrival_rate`.
pub fn estimate_load(volumes: &[f64], period_seconds: f64) -> EngineResult<LoadEstimate> {
    if !period_seconds.is_finite() || period_seconds <= 0.0 {
        return Err(EngineError::InvalidParameters {
            message: format!(
                "observation period must be a positive finite number of seconds, got {}",
                period_seconds
            ),
        });
    }

    if volumes.is_empty() {
        return Err(EngineError::EmptyInput(
            "cannot estimate arrival rates from zero observations".into(),
        ));
    }

    for (index, volume) in volumes.iter().enumerate() {
        if !volume.is_finite() || *volume < 0.0 {
            return Err(EngineError::InvalidParameters {
                message: format!(
                    "volume at index {} is {}; volumes must be non-negative finite numbers",
                    index, volume
                ),
            });
        }
    }

    let count = volumes.len() as f64;
    let mean: f64 = volumes.iter().sum::<f64>() / count;
    let peak = volumes
        .iter()
        .copied()
        .map(OrderedFloat)
        .max()
        .map(OrderedFloat::into_inner)
        .unwrap_or(0.0);

    let estimate = LoadEstimate {
        mean_arrival_rate: mean / period_seconds,
        peak_arrival_rate: peak / period_seconds,
        period_seconds,
    };

    debug!(
        target: "fluxo::estimation",
        observations = volumes.len(),
        mean_arrival_rate = estimate.mean_arrival_rate,
        peak_arrival_rate = estimate.peak_arrival_rate,
        "Load estimate derived"
    );

    Ok(estimate)
}

// ----------------------------------------------------------------------------
// 8.2 Service Rate Suggestion
// ----------------------------------------------------------------------------

/// Suggest a service rate for what-if analysis: the peak arrival rate scaled
/// by a headroom factor, never below the given floor.
pub fn suggest_service_rate(load: &LoadEstimate, headroom: f64, floor: f64) -> f64 {
    (load.peak_arrival_rate * headroom).max(floor)
}

// ----------------------------------------------------------------------------
// 8.3 Scenario Analysis
// ----------------------------------------------------------------------------

/// Analyze a volume series under a given service capacity.
///
/// Derives the load estimate, then computes steady-state metrics for the
/// average-period and peak-period scenarios. The call fails as a whole if
/// either scenario is invalid or unstable; no partial results are returned.
/// The peak scenario is the binding one: when it fails, the error names the
/// peak arrival rate against the aggregate capacity.
pub fn analyze_series(
    series: &VolumeSeries,
    service_rate: f64,
    servers: u32,
    period_seconds: f64,
) -> EngineResult<ScenarioAnalysis> {
    let summary = series.summary()?;
    let load = series.load_estimate(period_seconds)?;

    let average = queue_metrics(load.mean_arrival_rate, service_rate, servers)?;
    let peak = queue_metrics(load.peak_arrival_rate, service_rate, servers)?;

    info!(
        target: "fluxo::estimation",
        observations = summary.count,
        service_rate,
        servers,
        average_utilization = average.utilization,
        peak_utilization = peak.utilization,
        "Scenario analysis complete"
    );

    Ok(ScenarioAnalysis {
        summary,
        load,
        service_rate,
        servers,
        average,
        peak,
    })
}

// ============================================================================
// SECTION 9: ANALYSIS ENGINE
// ============================================================================
// A thin configuration-holding facade over the pure functions, used by the
// CLI and by embedding callers that want config-driven defaults. It carries
// no mutable state; every method is a pure function of its arguments plus
// the immutable configuration.
// ============================================================================

/// The main engine facade
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    /// Configuration
    config: EngineConfig,
}

impl AnalysisEngine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Create engine from configuration file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let config = EngineConfig::load(path)?;
        Ok(Self::new(config))
    }

    /// Get current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Steady-state metrics for a single-server system.
    pub fn single_server(&self, arrival_rate: f64, service_rate: f64) -> EngineResult<QueueMetrics> {
        mm1_metrics(arrival_rate, service_rate)
    }

    /// Steady-state metrics for a multi-server system, honoring the
    /// configured server limit.
    pub fn multi_server(
        &self,
        arrival_rate: f64,
        service_rate: f64,
        servers: u32,
    ) -> EngineResult<QueueMetrics> {
        if servers > self.config.analysis.max_servers {
            return Err(EngineError::InvalidParameters {
                message: format!(
                    "server count {} exceeds the configured limit of {}",
                    servers, self.config.analysis.max_servers
                ),
            });
        }
        mmc_metrics(arrival_rate, service_rate, servers)
    }

    /// Derive a load estimate using the configured observation period.
    pub fn estimate(&self, volumes: &[f64]) -> EngineResult<LoadEstimate> {
        estimate_load(volumes, self.config.analysis.period_seconds)
    }

    /// Suggested service rate for a load estimate, per the configured
    /// headroom and floor.
    pub fn suggested_service_rate(&self, load: &LoadEstimate) -> f64 {
        suggest_service_rate(
            load,
            self.config.analysis.service_rate_headroom,
            self.config.analysis.service_rate_floor,
        )
    }

    /// Two-scenario analysis of a volume series. When no service rate is
    /// given, one is suggested from the peak arrival rate.
    pub fn analyze(
        &self,
        series: &VolumeSeries,
        service_rate: Option<f64>,
        servers: u32,
    ) -> EngineResult<ScenarioAnalysis> {
        let period_seconds = self.config.analysis.period_seconds;

        let service_rate = match service_rate {
            Some(rate) => rate,
            None => {
                let load = series.load_estimate(period_seconds)?;
                let suggested = self.suggested_service_rate(&load);
                debug!(
                    target: "fluxo::engine",
                    suggested_service_rate = suggested,
                    "No service rate given, derived one from the peak arrival rate"
                );
                suggested
            }
        };

        if servers > self.config.analysis.max_servers {
            return Err(EngineError::InvalidParameters {
                message: format!(
                    "server count {} exceeds the configured limit of {}",
                    servers, self.config.analysis.max_servers
                ),
            });
        }

        analyze_series(series, service_rate, servers, period_seconds)
    }

    /// Classify a metric set against the configured saturation thresholds.
    pub fn saturation(&self, metrics: &QueueMetrics) -> SaturationLevel {
        metrics.saturation_with(
            self.config.analysis.utilization_warn,
            self.config.analysis.utilization_critical,
        )
    }
}

// ============================================================================
// SECTION 10: CLI & COMMAND LINE INTERFACE
// ============================================================================
// Command-line interface for the engine with:
// - Subcommands for each operation
// - Configuration file handling
// - Text and JSON output
// - Environment variable support
// ============================================================================

// ----------------------------------------------------------------------------
// 10.1 CLI Argument Parser
// ----------------------------------------------------------------------------

/// Fluxo Engine CLI
#[derive(Parser, Debug)]
#[command(
    name = "fluxo",
    author = "Fluxo Team",
    version,
    about = "Analytical queueing engine for steady-state performance estimation",
    long_about = "Fluxo computes steady-state performance metrics of queueing systems \
                  from closed-form analytical models (M/M/1 and Erlang-C M/M/c), and \
                  derives model inputs from observed per-period load volumes."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "fluxo.toml", env = "FLUXO_CONFIG")]
    pub config: PathBuf,

    /// Log level override
    #[arg(short, long, env = "FLUXO_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, env = "FLUXO_DEBUG")]
    pub debug: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute steady-state M/M/1 metrics
    Mm1 {
        /// Arrival rate λ (req/s)
        #[arg(long, value_name = "REQ_PER_S")]
        arrival_rate: f64,

        /// Service rate μ (req/s)
        #[arg(long, value_name = "REQ_PER_S")]
        service_rate: f64,

        /// Output format (text, json)
        #[arg(short = 'o', long, default_value = "text")]
        format: String,
    },

    /// Compute steady-state M/M/c metrics via Erlang-C
    Mmc {
        /// Arrival rate λ (req/s)
        #[arg(long, value_name = "REQ_PER_S")]
        arrival_rate: f64,

        /// Service rate μ per server (req/s)
        #[arg(long, value_name = "REQ_PER_S")]
        service_rate: f64,

        /// Number of identical parallel servers
        #[arg(long, value_name = "COUNT")]
        servers: u32,

        /// Output format (text, json)
        #[arg(short = 'o', long, default_value = "text")]
        format: String,
    },

    /// Estimate arrival rates from per-period volumes
    Estimate {
        /// Volume observations, one per period
        #[arg(required = true, num_args = 1.., value_name = "VOLUME")]
        volumes: Vec<f64>,

        /// Period length in seconds (default: configured value)
        #[arg(long, value_name = "SECONDS")]
        period_seconds: Option<f64>,

        /// Output format (text, json)
        #[arg(short = 'o', long, default_value = "text")]
        format: String,
    },

    /// Analyze a volume series: average and peak scenario metrics
    Analyze {
        /// Volume observations, one per period
        #[arg(required = true, num_args = 1.., value_name = "VOLUME")]
        volumes: Vec<f64>,

        /// Service rate μ per server (req/s); suggested from the peak when omitted
        #[arg(long, value_name = "REQ_PER_S")]
        service_rate: Option<f64>,

        /// Number of identical parallel servers
        #[arg(long, default_value_t = 1, value_name = "COUNT")]
        servers: u32,

        /// Output format (text, json)
        #[arg(short = 'o', long, default_value = "text")]
        format: String,
    },

    /// Validate configuration file
    Validate {
        /// Show full parsed configuration
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show engine version and build info
    Version,
}

// ----------------------------------------------------------------------------
// 10.2 CLI Handler Functions
// ----------------------------------------------------------------------------

/// Render a metric set as indented bullet lines.
fn print_metrics(metrics: &QueueMetrics, engine: &AnalysisEngine) {
    println!(
        "  • Utilization ρ:             {:.6} ({})",
        metrics.utilization,
        engine.saturation(metrics)
    );
    println!("  • Mean in system L:          {:.6} requests", metrics.mean_in_system);
    println!("  • Mean in queue Lq:          {:.6} requests", metrics.mean_in_queue);
    println!("  • Mean time in system W:     {:.6} s", metrics.mean_time_in_system);
    println!("  • Mean time in queue Wq:     {:.6} s", metrics.mean_time_in_queue);
    if let Some(p0) = metrics.empty_probability {
        println!("  • Empty-system probability:  {:.6}", p0);
    }
}

/// Handle the mm1 subcommand
fn handle_mm1(
    engine: &AnalysisEngine,
    arrival_rate: f64,
    service_rate: f64,
    format: &str,
) -> EngineResult<()> {
    let metrics = engine.single_server(arrival_rate, service_rate)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!(
            "📊 M/M/1 steady-state metrics (λ = {} req/s, μ = {} req/s)",
            arrival_rate, service_rate
        );
        print_metrics(&metrics, engine);
    }

    Ok(())
}

/// Handle the mmc subcommand
fn handle_mmc(
    engine: &AnalysisEngine,
    arrival_rate: f64,
    service_rate: f64,
    servers: u32,
    format: &str,
) -> EngineResult<()> {
    let metrics = engine.multi_server(arrival_rate, service_rate, servers)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!(
            "📊 M/M/{} steady-state metrics (λ = {} req/s, μ = {} req/s per server)",
            servers, arrival_rate, service_rate
        );
        print_metrics(&metrics, engine);
    }

    Ok(())
}

/// Handle the estimate subcommand
fn handle_estimate(
    engine: &AnalysisEngine,
    volumes: &[f64],
    period_seconds: Option<f64>,
    format: &str,
) -> EngineResult<()> {
    let period = period_seconds.unwrap_or(engine.config().analysis.period_seconds);
    let estimate = estimate_load(volumes, period)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        println!(
            "📈 Load estimate from {} observation(s), {} s per period",
            volumes.len(),
            period
        );
        println!("  • Mean arrival rate λ:   {:.6} req/s", estimate.mean_arrival_rate);
        println!("  • Peak arrival rate λ:   {:.6} req/s", estimate.peak_arrival_rate);
        println!(
            "  • Suggested service rate: {:.6} req/s",
            engine.suggested_service_rate(&estimate)
        );
    }

    Ok(())
}

/// Handle the analyze subcommand
fn handle_analyze(
    engine: &AnalysisEngine,
    volumes: &[f64],
    service_rate: Option<f64>,
    servers: u32,
    format: &str,
) -> EngineResult<()> {
    let series = VolumeSeries::from_volumes(volumes.iter().copied());
    let analysis = engine.analyze(&series, service_rate, servers)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!(
        "📊 Scenario analysis: {} observation(s), μ = {} req/s per server, c = {}",
        analysis.summary.count, analysis.service_rate, analysis.servers
    );
    if service_rate.is_none() {
        println!("  (service rate suggested from the peak arrival rate)");
    }
    println!("\nVolume summary:");
    println!("  • Mean volume per period:  {:.2}", analysis.summary.mean);
    println!("  • Peak volume per period:  {:.2}", analysis.summary.max);
    println!("\nDerived load:");
    println!("  • Mean arrival rate λ:     {:.6} req/s", analysis.load.mean_arrival_rate);
    println!("  • Peak arrival rate λ:     {:.6} req/s", analysis.load.peak_arrival_rate);
    println!("\nAverage period scenario:");
    print_metrics(&analysis.average, engine);
    println!("\nPeak period scenario:");
    print_metrics(&analysis.peak, engine);

    Ok(())
}

/// Handle the validate subcommand
fn handle_validate(config_path: &Path, verbose: bool) -> EngineResult<()> {
    println!("Validating configuration file: {}", config_path.display());

    match EngineConfig::load(config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid!");

            if verbose {
                println!("\n📋 Parsed configuration:");
                println!("{}", "=".repeat(60));
                match toml::to_string_pretty(&config) {
                    Ok(s) => println!("{}", s),
                    Err(e) => println!("Failed to serialize: {}", e),
                }
            }

            // Show summary
            println!("\n📊 Configuration Summary:");
            println!("  • Instance name: {}", config.engine.instance_name);
            println!("  • Environment: {}", config.engine.environment);
            println!("  • Observation period: {} s", config.analysis.period_seconds);
            println!(
                "  • Service rate suggestion: max({} × peak λ, {} req/s)",
                config.analysis.service_rate_headroom, config.analysis.service_rate_floor
            );
            println!(
                "  • Saturation thresholds: warn {} / critical {}",
                config.analysis.utilization_warn, config.analysis.utilization_critical
            );
            println!("  • Server limit: {}", config.analysis.max_servers);

            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed!");
            println!("Error: {}", e);
            Err(EngineError::Config(e))
        }
    }
}

/// Handle the generate-config subcommand
fn handle_generate_config(output: Option<&Path>) -> EngineResult<()> {
    let config_str = EngineConfig::generate_default_config();

    match output {
        Some(path) => {
            fs::write(path, &config_str)
                .map_err(|e| EngineError::Internal(format!("Failed to write config: {}", e)))?;
            println!("✅ Default configuration written to: {}", path.display());
        }
        None => {
            println!("{}", config_str);
        }
    }

    Ok(())
}

/// Handle the version subcommand
fn handle_version() {
    println!("🌊 {} v{}", ENGINE_FULL_NAME, ENGINE_VERSION);
    println!();
    println!("Build Information:");
    println!("  • Target: {}", std::env::consts::ARCH);
    println!("  • OS: {}", std::env::consts::OS);
    println!("  • Family: {}", std::env::consts::FAMILY);
    println!();
    println!("Features:");
    println!("  • Closed-form M/M/1 steady-state metrics");
    println!("  • Erlang-C M/M/c metrics with incremental evaluation");
    println!("  • Arrival-rate estimation from observed volumes");
    println!("  • Average-period and peak-period scenario analysis");
    println!("  • Text and JSON output");
}

// ============================================================================
// SECTION 11: MAIN ENTRY POINT
// ============================================================================

/// Main entry point for the Fluxo engine
fn main() -> AnyhowResult<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle subcommands that don't need full initialization
    match &cli.command {
        Some(Commands::Version) => {
            handle_version();
            return Ok(());
        }
        Some(Commands::GenerateConfig { output }) => {
            handle_generate_config(output.as_deref())?;
            return Ok(());
        }
        Some(Commands::Validate { verbose }) => {
            handle_validate(&cli.config, *verbose)?;
            return Ok(());
        }
        _ => {}
    }

    // Load configuration
    let config_missing = !cli.config.exists();
    let config = if config_missing {
        EngineConfig::default()
    } else {
        EngineConfig::load(&cli.config)
            .with_context(|| format!("Failed to load config from {}", cli.config.display()))?
    };

    // Override log level if specified
    let mut logging_config = config.logging.clone();
    if let Some(level) = &cli.log_level {
        logging_config.level = level.clone();
    }
    if cli.debug {
        logging_config.level = "debug".into();
    }

    // Initialize logging
    init_logging(&logging_config)?;

    if config_missing {
        info!(
            target: "fluxo::init",
            path = %cli.config.display(),
            "Config file not found, using defaults"
        );
    }

    let engine = AnalysisEngine::new(config);

    // Handle remaining subcommands
    match cli.command {
        Some(Commands::Mm1 {
            arrival_rate,
            service_rate,
            format,
        }) => {
            handle_mm1(&engine, arrival_rate, service_rate, &format)?;
        }
        Some(Commands::Mmc {
            arrival_rate,
            service_rate,
            servers,
            format,
        }) => {
            handle_mmc(&engine, arrival_rate, service_rate, servers, &format)?;
        }
        Some(Commands::Estimate {
            volumes,
            period_seconds,
            format,
        }) => {
            handle_estimate(&engine, &volumes, period_seconds, &format)?;
        }
        Some(Commands::Analyze {
            volumes,
            service_rate,
            servers,
            format,
        }) => {
            handle_analyze(&engine, &volumes, service_rate, servers, &format)?;
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
        _ => unreachable!(),
    }

    Ok(())
}

// ============================================================================
// SECTION 12: TESTS
// ============================================================================


// ============================================================================
// SECTION 13: PHASE 2 TESTS - QUEUEING MODELS
// ============================================================================

#[cfg(test)]
mod phase2_tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    /// Relative-tolerance comparison used throughout the model tests.
    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance * scale,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_mm1_reference_case() {
        // λ=30, μ=50: ρ=0.6, L=1.5, Lq=0.9, W=0.05, Wq=0.03
        let metrics = mm1_metrics(30.0, 50.0).unwrap();

        assert_close(metrics.utilization, 0.6, 1e-9);
        assert_close(metrics.mean_in_system, 1.5, 1e-9);
        assert_close(metrics.mean_in_queue, 0.9, 1e-9);
        assert_close(metrics.mean_time_in_system, 0.05, 1e-9);
        assert_close(metrics.mean_time_in_queue, 0.03, 1e-9);
        assert!(metrics.empty_probability.is_none());
    }

    #[test]
    fn test_mm1_consistency_identities() {
        let metrics = mm1_metrics(42.0, 97.0).unwrap();

        assert!(metrics.utilization > 0.0 && metrics.utilization < 1.0);
        assert_close(metrics.mean_in_system, metrics.mean_in_queue + metrics.utilization, 1e-9);
        assert_close(
            metrics.mean_time_in_system,
            metrics.mean_time_in_queue + 1.0 / 97.0,
            1e-9,
        );
        // Little's law: L = λ·W
        assert_close(metrics.mean_in_system, 42.0 * metrics.mean_time_in_system, 1e-9);
        assert!(metrics.is_consistent(42.0, 97.0));
    }

    #[test]
    fn test_mm1_boundary_is_unstable() {
        // λ == μ has no steady state
        let err = mm1_metrics(50.0, 50.0).unwrap_err();
        assert!(matches!(err, EngineError::UnstableSystem { .. }));

        let err = mm1_metrics(80.0, 50.0).unwrap_err();
        assert!(matches!(err, EngineError::UnstableSystem { .. }));
    }

    #[rstest]
    #[case(0.0, 50.0)]
    #[case(-3.0, 50.0)]
    #[case(30.0, 0.0)]
    #[case(30.0, -2.0)]
    #[case(f64::NAN, 50.0)]
    #[case(30.0, f64::INFINITY)]
    fn test_mm1_invalid_parameters(#[case] arrival_rate: f64, #[case] service_rate: f64) {
        let err = mm1_metrics(arrival_rate, service_rate).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { .. }));
    }

    #[test]
    fn test_mmc_reference_case() {
        // λ=30, μ=20, c=2: a=1.5, ρ=0.75.
        // For c=2 the Erlang-C empty probability has the closed form
        // P0 = (1−ρ)/(1+ρ) = 1/7, which pins Lq = P0·a²·ρ/(2(1−ρ)²) = 27/14.
        let metrics = mmc_metrics(30.0, 20.0, 2).unwrap();

        assert_close(metrics.utilization, 0.75, 1e-9);

        let p0 = metrics.empty_probability.unwrap();
        assert!(p0 > 0.0 && p0 < 1.0);
        assert_close(p0, 1.0 / 7.0, 1e-9);
        assert_close(metrics.mean_in_queue, 27.0 / 14.0, 1e-9);
        assert_close(metrics.mean_in_system, 27.0 / 14.0 + 1.5, 1e-9);

        // Little's law and the time decomposition
        assert_close(metrics.mean_in_system, 30.0 * metrics.mean_time_in_system, 1e-9);
        assert_close(
            metrics.mean_time_in_system,
            metrics.mean_time_in_queue + 1.0 / 20.0,
            1e-9,
        );
    }

    #[rstest]
    #[case(3.0, 10.0)]
    #[case(30.0, 50.0)]
    #[case(0.25, 0.3)]
    fn test_mmc_with_one_server_reduces_to_mm1(#[case] arrival_rate: f64, #[case] service_rate: f64) {
        let single = mm1_metrics(arrival_rate, service_rate).unwrap();
        let multi = mmc_metrics(arrival_rate, service_rate, 1).unwrap();

        assert_close(multi.utilization, single.utilization, 1e-9);
        assert_close(multi.mean_in_system, single.mean_in_system, 1e-9);
        assert_close(multi.mean_in_queue, single.mean_in_queue, 1e-9);
        assert_close(multi.mean_time_in_system, single.mean_time_in_system, 1e-9);
        assert_close(multi.mean_time_in_queue, single.mean_time_in_queue, 1e-9);

        // With one server the empty probability is 1−ρ
        let p0 = multi.empty_probability.unwrap();
        assert_close(p0, 1.0 - single.utilization, 1e-9);
    }

    #[test]
    fn test_mmc_unstable_at_and_above_capacity() {
        // λ == c·μ
        let err = mmc_metrics(40.0, 20.0, 2).unwrap_err();
        assert!(matches!(err, EngineError::UnstableSystem { .. }));

        let err = mmc_metrics(50.0, 20.0, 2).unwrap_err();
        assert!(matches!(err, EngineError::UnstableSystem { .. }));
    }

    #[test]
    fn test_mmc_rejects_zero_servers() {
        let err = mmc_metrics(30.0, 20.0, 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { .. }));
    }

    #[test]
    fn test_mmc_incremental_sum_matches_direct_evaluation() {
        // Small c: the running-term evaluation must agree with a naive
        // factorial/power evaluation of the same formulas.
        fn factorial(n: u32) -> f64 {
            (1..=n).map(|k| k as f64).product()
        }

        for servers in 1..=10u32 {
            let service_rate = 10.0;
            let arrival_rate = 0.8 * servers as f64 * service_rate;
            let offered = arrival_rate / service_rate;
            let rho = offered / servers as f64;

            let direct_sum: f64 = (0..servers)
                .map(|n| offered.powi(n as i32) / factorial(n))
                .sum();
            let direct_tail = offered.powi(servers as i32) / (factorial(servers) * (1.0 - rho));
            let direct_p0 = 1.0 / (direct_sum + direct_tail);

            let metrics = mmc_metrics(arrival_rate, service_rate, servers).unwrap();
            let p0 = metrics.empty_probability.unwrap();

            assert_close(p0, direct_p0, 1e-12);
        }
    }

    #[test]
    fn test_mmc_large_server_count_stays_finite() {
        // c=500 at 80% utilization: a^c and c! individually overflow f64,
        // the incremental ratio does not.
        let metrics = mmc_metrics(400.0, 1.0, 500).unwrap();
        let p0 = metrics.empty_probability.unwrap();

        assert!(metrics.mean_in_queue.is_finite());
        assert!(metrics.mean_in_queue >= 0.0);
        assert!(p0 > 0.0 && p0 <= 1.0);
        assert_close(metrics.utilization, 0.8, 1e-9);
        assert_close(metrics.mean_in_system, 400.0 * metrics.mean_time_in_system, 1e-9);
    }

    #[test]
    fn test_models_are_idempotent() {
        let first = mm1_metrics(30.0, 50.0).unwrap();
        let second = mm1_metrics(30.0, 50.0).unwrap();
        assert_eq!(first, second);

        let first = mmc_metrics(30.0, 20.0, 2).unwrap();
        let second = mmc_metrics(30.0, 20.0, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_queue_metrics_dispatch() {
        let via_dispatch = queue_metrics(30.0, 50.0, 1).unwrap();
        assert!(via_dispatch.empty_probability.is_none());

        let via_dispatch = queue_metrics(30.0, 20.0, 2).unwrap();
        assert!(via_dispatch.empty_probability.is_some());
    }

    proptest! {
        #[test]
        fn prop_mm1_identities_hold_for_stable_systems(
            arrival_rate in 0.01f64..500.0,
            utilization in 0.01f64..0.99,
        ) {
            let service_rate = arrival_rate / utilization;
            let metrics = mm1_metrics(arrival_rate, service_rate).unwrap();

            prop_assert!(metrics.utilization > 0.0 && metrics.utilization < 1.0);
            prop_assert!(metrics.mean_in_queue >= 0.0);
            prop_assert!(metrics.mean_time_in_queue >= 0.0);
            prop_assert!(metrics.is_consistent(arrival_rate, service_rate));
        }

        #[test]
        fn prop_mm1_rejects_saturated_systems(
            service_rate in 0.01f64..500.0,
            factor in 1.0f64..10.0,
        ) {
            let arrival_rate = service_rate * factor;
            let result = mm1_metrics(arrival_rate, service_rate);

            let is_unstable = matches!(result, Err(EngineError::UnstableSystem { .. }));
            prop_assert!(is_unstable);
        }

        #[test]
        fn prop_mmc_identities_hold_for_stable_systems(
            service_rate in 0.1f64..100.0,
            utilization in 0.01f64..0.99,
            servers in 1u32..32,
        ) {
            let arrival_rate = utilization * servers as f64 * service_rate;
            let metrics = mmc_metrics(arrival_rate, service_rate, servers).unwrap();
            let p0 = metrics.empty_probability.unwrap();

            prop_assert!(p0 > 0.0 && p0 <= 1.0);
            prop_assert!(metrics.mean_in_queue >= 0.0);
            prop_assert!(metrics.is_consistent(arrival_rate, service_rate));
        }

        #[test]
        fn prop_mmc_rejects_saturated_systems(
            service_rate in 0.1f64..100.0,
            servers in 1u32..32,
            factor in 1.0f64..5.0,
        ) {
            let arrival_rate = servers as f64 * service_rate * factor;
            let result = mmc_metrics(arrival_rate, service_rate, servers);

            let is_unstable = matches!(result, Err(EngineError::UnstableSystem { .. }));
            prop_assert!(is_unstable);
        }
    }
}

// ============================================================================
// SECTION 14: PHASE 3 TESTS - LOAD ESTIMATION & SCENARIOS
// ============================================================================

#[cfg(test)]
mod phase3_tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance * scale,
            "expected {expected}, got {actual}"
        );
    }

    /// Config with a one-second period so volumes map directly to req/s.
    fn per_second_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.analysis.period_seconds = 1.0;
        config
    }

    #[test]
    fn test_estimate_reference_case() {
        let estimate = estimate_load(&[100.0, 200.0, 300.0], 86_400.0).unwrap();

        assert_close(estimate.mean_arrival_rate, 200.0 / 86_400.0, 1e-12);
        assert_close(estimate.peak_arrival_rate, 300.0 / 86_400.0, 1e-12);
        // Spec'd to the published approximations as well
        assert!((estimate.mean_arrival_rate - 0.002_314_8).abs() < 1e-6);
        assert!((estimate.peak_arrival_rate - 0.003_472_2).abs() < 1e-6);
    }

    #[test]
    fn test_estimate_empty_input_fails() {
        let err = estimate_load(&[], 86_400.0).unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput(_)));
    }

    #[test]
    fn test_estimate_rejects_negative_volume() {
        let err = estimate_load(&[100.0, -1.0, 300.0], 86_400.0).unwrap_err();
        match err {
            EngineError::InvalidParameters { message } => {
                assert!(message.contains("index 1"));
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn test_estimate_rejects_bad_period() {
        let err = estimate_load(&[100.0], 0.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { .. }));

        let err = estimate_load(&[100.0], -60.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { .. }));
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let first = estimate_load(&[10.0, 20.0, 30.0], 3600.0).unwrap();
        let second = estimate_load(&[10.0, 20.0, 30.0], 3600.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_suggest_service_rate_applies_headroom_and_floor() {
        let load = LoadEstimate {
            mean_arrival_rate: 20.0,
            peak_arrival_rate: 30.0,
            period_seconds: 1.0,
        };
        assert_close(suggest_service_rate(&load, 2.0, 1.0), 60.0, 1e-12);

        // Tiny peaks fall back to the floor
        let load = LoadEstimate {
            mean_arrival_rate: 0.001,
            peak_arrival_rate: 0.002,
            period_seconds: 1.0,
        };
        assert_close(suggest_service_rate(&load, 2.0, 1.0), 1.0, 1e-12);
    }

    #[test]
    fn test_analyze_series_two_scenarios() {
        let series = VolumeSeries::from_volumes(vec![10.0, 20.0, 30.0]);
        let analysis = analyze_series(&series, 50.0, 1, 1.0).unwrap();

        // λ_avg = 20, λ_peak = 30 against μ = 50
        assert_close(analysis.load.mean_arrival_rate, 20.0, 1e-12);
        assert_close(analysis.load.peak_arrival_rate, 30.0, 1e-12);
        assert_close(analysis.average.utilization, 0.4, 1e-9);
        assert_close(analysis.peak.utilization, 0.6, 1e-9);
        assert_close(analysis.peak.mean_in_system, 1.5, 1e-9);
        assert_eq!(analysis.servers, 1);
    }

    #[test]
    fn test_analyze_series_fails_whole_when_peak_unstable() {
        // Average load is fine, the peak saturates the server: no partial
        // results are returned.
        let series = VolumeSeries::from_volumes(vec![10.0, 60.0]);
        let err = analyze_series(&series, 50.0, 1, 1.0).unwrap_err();

        assert!(matches!(err, EngineError::UnstableSystem { .. }));
    }

    #[test]
    fn test_analyze_series_multi_server_scenarios() {
        let series = VolumeSeries::from_volumes(vec![20.0, 30.0]);
        let analysis = analyze_series(&series, 20.0, 2, 1.0).unwrap();

        // Peak scenario is the λ=30, μ=20, c=2 reference case
        assert_close(analysis.peak.utilization, 0.75, 1e-9);
        assert_close(analysis.peak.empty_probability.unwrap(), 1.0 / 7.0, 1e-9);
        assert!(analysis.average.empty_probability.is_some());
    }

    #[test]
    fn test_engine_estimate_uses_configured_period() {
        let engine = AnalysisEngine::new(EngineConfig::default());
        let estimate = engine.estimate(&[100.0, 200.0, 300.0]).unwrap();

        assert_close(estimate.period_seconds, DEFAULT_PERIOD_SECONDS, 1e-12);
        assert_close(estimate.mean_arrival_rate, 200.0 / 86_400.0, 1e-12);
    }

    #[test]
    fn test_engine_suggests_service_rate_when_absent() {
        let engine = AnalysisEngine::new(per_second_config());
        let series = VolumeSeries::from_volumes(vec![10.0, 20.0, 30.0]);

        // Suggested μ = max(2 × 30, 1) = 60, so the peak runs at ρ = 0.5
        let analysis = engine.analyze(&series, None, 1).unwrap();
        assert_close(analysis.service_rate, 60.0, 1e-12);
        assert_close(analysis.peak.utilization, 0.5, 1e-9);
    }

    #[test]
    fn test_engine_enforces_server_limit() {
        let mut config = per_second_config();
        config.analysis.max_servers = 4;
        let engine = AnalysisEngine::new(config);

        let err = engine.multi_server(10.0, 20.0, 8).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { .. }));

        let series = VolumeSeries::from_volumes(vec![10.0]);
        let err = engine.analyze(&series, Some(20.0), 8).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { .. }));
    }

    #[test]
    fn test_engine_saturation_uses_configured_thresholds() {
        let mut config = per_second_config();
        config.analysis.utilization_warn = 0.5;
        config.analysis.utilization_critical = 0.8;
        let engine = AnalysisEngine::new(config);

        let metrics = engine.single_server(30.0, 50.0).unwrap();
        assert_eq!(engine.saturation(&metrics), SaturationLevel::Elevated);
        assert_eq!(metrics.saturation(), SaturationLevel::Normal);
    }

    #[test]
    fn test_scenario_analysis_serialization() {
        let series = VolumeSeries::from_volumes(vec![10.0, 20.0, 30.0]);
        let analysis = analyze_series(&series, 50.0, 1, 1.0).unwrap();

        let json: JsonValue = serde_json::to_value(&analysis).unwrap();
        assert!(json.get("summary").is_some());
        assert!(json.get("load").is_some());
        assert!(json.get("average").is_some());
        assert!(json.get("peak").is_some());
        assert!(json["average"].get("rho").is_some());
    }

    proptest! {
        #[test]
        fn prop_peak_rate_never_below_mean_rate(
            volumes in proptest::collection::vec(0.0f64..1e9, 1..50),
            period in 1.0f64..1e6,
        ) {
            let estimate = estimate_load(&volumes, period).unwrap();
            prop_assert!(estimate.peak_arrival_rate >= estimate.mean_arrival_rate);
        }

        #[test]
        fn prop_estimate_scales_inversely_with_period(
            volumes in proptest::collection::vec(1.0f64..1e6, 1..20),
        ) {
            let hourly = estimate_load(&volumes, 3600.0).unwrap();
            let daily = estimate_load(&volumes, 86_400.0).unwrap();

            // A longer period spreads the same volume over more seconds
            prop_assert!(daily.mean_arrival_rate <= hourly.mean_arrival_rate);
            prop_assert!(daily.peak_arrival_rate <= hourly.peak_arrival_rate);
        }
    }
}

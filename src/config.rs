//! Configuration management for the blink monitor

use crate::{constants::*, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Baseline calibration
    pub calibration: CalibrationConfig,

    /// EAR smoothing
    pub smoothing: SmoothingConfig,

    /// Head tilt and eyewear compensation
    pub compensation: CompensationConfig,

    /// Blink classification
    pub blink: BlinkConfig,

    /// Blink rate window
    pub rate: RateConfig,

    /// Advisory cadence and delivery
    pub alerts: AlertConfig,

    /// Overlay output
    pub display: DisplayConfig,
}

/// Calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Number of face frames collected before the baseline is fixed
    pub frames: usize,

    /// Rank of the sorted window used as baseline (0.0-1.0)
    pub baseline_percentile: f64,
}

/// Smoothing filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type ("exponential" or "none")
    pub filter: String,

    /// Weight of the newest sample for the exponential filter
    pub alpha: f64,
}

/// EAR compensation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationConfig {
    /// EAR gain per unit of absolute pitch
    pub pitch_gain: f64,

    /// EAR scale applied when glasses are detected
    pub glasses_ear_scale: f64,

    /// Contour spacing variance above which glasses are assumed (px²)
    pub glasses_variance_threshold: f64,
}

/// Blink classification parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Closure threshold as a fraction of baseline EAR
    pub threshold_adjustment: f64,

    /// Added to the adjustment while glasses are detected
    pub glasses_threshold_bonus: f64,

    /// Minimum closed frames of a blink
    pub min_closed_frames: u32,

    /// Maximum closed frames of a blink
    pub max_closed_frames: u32,

    /// Open frames confirming a blink
    pub min_open_frames: u32,
}

/// Blink rate window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Window length in seconds
    pub window_secs: f64,
}

/// Advisory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Seconds between blink rate advisories
    pub interval_secs: f64,

    /// Below this BPM a fatigue advisory is raised
    pub slow_blink_threshold: usize,

    /// Above this BPM a stress advisory is raised
    pub fast_blink_threshold: usize,

    /// Notification sink ("log", "notify-send", "command:<program>")
    pub sink: String,

    /// Application name shown by desktop notifiers
    pub app_name: String,

    /// How long desktop notifications stay visible
    pub notification_timeout_secs: u32,

    /// Pending advisories held before new ones are dropped
    pub queue_capacity: usize,
}

/// Overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Append the state machine label to the EAR line
    pub show_state: bool,

    /// Log the overlay every N frames (0 disables)
    pub log_every_frames: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            frames: DEFAULT_CALIBRATION_FRAMES,
            baseline_percentile: DEFAULT_BASELINE_PERCENTILE,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "exponential".to_string(),
            alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            pitch_gain: DEFAULT_PITCH_GAIN,
            glasses_ear_scale: DEFAULT_GLASSES_EAR_SCALE,
            glasses_variance_threshold: DEFAULT_GLASSES_VARIANCE_THRESHOLD,
        }
    }
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            threshold_adjustment: DEFAULT_EAR_THRESHOLD_ADJUSTMENT,
            glasses_threshold_bonus: DEFAULT_GLASSES_THRESHOLD_BONUS,
            min_closed_frames: BLINK_DURATION_MIN_FRAMES,
            max_closed_frames: BLINK_DURATION_MAX_FRAMES,
            min_open_frames: MIN_OPEN_FRAMES,
        }
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            window_secs: RATE_WINDOW_SECS,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            interval_secs: NOTIFICATION_INTERVAL_SECS,
            slow_blink_threshold: SLOW_BLINK_THRESHOLD,
            fast_blink_threshold: FAST_BLINK_THRESHOLD,
            sink: "log".to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            notification_timeout_secs: DEFAULT_NOTIFICATION_TIMEOUT_SECS,
            queue_capacity: DEFAULT_NOTIFICATION_QUEUE,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_state: true,
            log_every_frames: 30,
        }
    }
}

impl BlinkConfig {
    /// Threshold fraction for the current frame
    #[must_use]
    pub fn adjustment(&self, glasses: bool) -> f64 {
        if glasses {
            self.threshold_adjustment + self.glasses_threshold_bonus
        } else {
            self.threshold_adjustment
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Create the EAR smoothing filter from configuration
    pub fn create_filter(&self) -> Result<Box<dyn crate::filters::EarFilter>> {
        use crate::filters::{create_filter, exponential::ExponentialFilter};

        match self.smoothing.filter.as_str() {
            "exponential" => Ok(Box::new(ExponentialFilter::try_new(self.smoothing.alpha)?)),
            name => create_filter(name),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Calibration
        if self.calibration.frames == 0 {
            return Err(Error::ConfigError(
                "Calibration frames must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.calibration.baseline_percentile) {
            return Err(Error::ConfigError(
                "Baseline percentile must be between 0.0 and 1.0".to_string(),
            ));
        }

        // Smoothing
        if !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return Err(Error::ConfigError(
                "Smoothing alpha must be in (0.0, 1.0]".to_string(),
            ));
        }

        // Compensation
        if !self.compensation.pitch_gain.is_finite() || self.compensation.pitch_gain < 0.0 {
            return Err(Error::ConfigError("Pitch gain must be non-negative".to_string()));
        }
        if !(self.compensation.glasses_ear_scale > 0.0) {
            return Err(Error::ConfigError("Glasses EAR scale must be positive".to_string()));
        }
        if !self.compensation.glasses_variance_threshold.is_finite() {
            return Err(Error::ConfigError(
                "Glasses variance threshold must be finite".to_string(),
            ));
        }

        // Blink classification
        if !(self.blink.threshold_adjustment > 0.0) {
            return Err(Error::ConfigError(
                "Threshold adjustment must be positive".to_string(),
            ));
        }
        if self.blink.min_closed_frames == 0 || self.blink.min_open_frames == 0 {
            return Err(Error::ConfigError(
                "Minimum closed and open frames must be greater than 0".to_string(),
            ));
        }
        if self.blink.min_closed_frames > self.blink.max_closed_frames {
            return Err(Error::ConfigError(
                "Minimum closed frames must not exceed maximum closed frames".to_string(),
            ));
        }

        // Rate window and alerts
        if !(self.rate.window_secs > 0.0) {
            return Err(Error::ConfigError("Rate window must be positive".to_string()));
        }
        if !(self.alerts.interval_secs > 0.0) {
            return Err(Error::ConfigError(
                "Notification interval must be positive".to_string(),
            ));
        }
        if self.alerts.slow_blink_threshold > self.alerts.fast_blink_threshold {
            return Err(Error::ConfigError(
                "Slow blink threshold must not exceed fast blink threshold".to_string(),
            ));
        }
        if self.alerts.queue_capacity == 0 {
            return Err(Error::ConfigError(
                "Notification queue capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Blink Monitor Configuration

# Baseline calibration
calibration:
  frames: 30
  baseline_percentile: 0.7

# EAR smoothing
smoothing:
  filter: "exponential"
  alpha: 0.7

# Head tilt and eyewear compensation
compensation:
  pitch_gain: 0.2
  glasses_ear_scale: 0.92
  glasses_variance_threshold: 60.0

# Blink classification
blink:
  threshold_adjustment: 0.78
  glasses_threshold_bonus: 0.03
  min_closed_frames: 1
  max_closed_frames: 7
  min_open_frames: 2

# Blink rate window
rate:
  window_secs: 60.0

# Advisories
alerts:
  interval_secs: 3600.0
  slow_blink_threshold: 10
  fast_blink_threshold: 25
  sink: "log"
  app_name: "Blink Monitor"
  notification_timeout_secs: 30
  queue_capacity: 16

# Overlay output
display:
  show_state: true
  log_every_frames: 30
"#;

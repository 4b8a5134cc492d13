//! Launch configuration with environment variable support.
//!
//! Settings are read once per process and handed to the engine explicitly;
//! nothing below the engine reads the environment.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SNAPSHOT_REFERENCE_PATH` | Reference store root | `__Snapshots__` |
//! | `SNAPSHOT_FAILURE_PATH` | Failure store root | `__Failures__` |
//! | `SNAPSHOT_RECORD_MODE` | Record instead of verify (`1`, `true`, `yes`, `on`) | off |
//! | `SNAPSHOT_TOLERANCE` | Maximum diff, parts per million | `0` |
//! | `SNAPSHOT_RENDER_OFFSET_Y` | Pixels cropped from the top of every capture | `0` |
//! | `SNAPSHOT_RENDER_DELAY_MS` | Default render-settle delay (ms) | `400` |
//!
//! Relative store roots are resolved against the folder of each test file;
//! absolute roots mirror the test folder beneath them.
//!
//! # Example
//!
//! ```bash
//! # Re-record every reference
//! SNAPSHOT_RECORD_MODE=1 cargo test
//!
//! # Collect references in one tree, allow 0.5% difference
//! export SNAPSHOT_REFERENCE_PATH="/var/snapshots/reference"
//! export SNAPSHOT_TOLERANCE=5000
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Default reference store root
pub const DEFAULT_REFERENCE_PATH: &str = "__Snapshots__";

/// Default failure store root
pub const DEFAULT_FAILURE_PATH: &str = "__Failures__";

/// Default tolerance (parts per million)
pub const DEFAULT_TOLERANCE: f64 = 0.0;

/// Default top crop band (pixels)
pub const DEFAULT_RENDER_OFFSET_Y: u32 = 0;

/// Default render-settle delay (milliseconds)
pub const DEFAULT_RENDER_DELAY_MS: u64 = 400;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the reference store root
pub const ENV_REFERENCE_PATH: &str = "SNAPSHOT_REFERENCE_PATH";

/// Environment variable for the failure store root
pub const ENV_FAILURE_PATH: &str = "SNAPSHOT_FAILURE_PATH";

/// Environment variable enabling record mode
pub const ENV_RECORD_MODE: &str = "SNAPSHOT_RECORD_MODE";

/// Environment variable for the tolerance
pub const ENV_TOLERANCE: &str = "SNAPSHOT_TOLERANCE";

/// Environment variable for the top crop band
pub const ENV_RENDER_OFFSET_Y: &str = "SNAPSHOT_RENDER_OFFSET_Y";

/// Environment variable for the render-settle delay
pub const ENV_RENDER_DELAY_MS: &str = "SNAPSHOT_RENDER_DELAY_MS";

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Get the process-wide settings (initialized from environment on first access)
pub fn get() -> &'static Settings {
    SETTINGS.get_or_init(Settings::from_env)
}

/// Engine settings fixed at launch
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Reference store root
    pub reference_dir: PathBuf,
    /// Failure store root
    pub failure_dir: PathBuf,
    /// Overwrite references instead of comparing against them
    pub record_mode: bool,
    /// Maximum accepted diff
    pub tolerance: f64,
    /// Pixels excluded from the top of every capture
    pub render_offset: u32,
    /// Render-settle delay for test cases that don't set their own
    pub render_delay: Duration,
}

impl Settings {
    /// Create settings from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create settings with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            reference_dir: PathBuf::from(DEFAULT_REFERENCE_PATH),
            failure_dir: PathBuf::from(DEFAULT_FAILURE_PATH),
            record_mode: false,
            tolerance: DEFAULT_TOLERANCE,
            render_offset: DEFAULT_RENDER_OFFSET_Y,
            render_delay: Duration::from_millis(DEFAULT_RENDER_DELAY_MS),
        }
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::defaults();
        Self {
            reference_dir: lookup(ENV_REFERENCE_PATH)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.reference_dir),
            failure_dir: lookup(ENV_FAILURE_PATH)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.failure_dir),
            record_mode: lookup(ENV_RECORD_MODE)
                .map(|s| parse_flag(&s))
                .unwrap_or(defaults.record_mode),
            tolerance: lookup(ENV_TOLERANCE)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|t| t.is_finite() && *t >= 0.0)
                .unwrap_or(defaults.tolerance),
            render_offset: lookup(ENV_RENDER_OFFSET_Y)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.render_offset),
            render_delay: lookup(ENV_RENDER_DELAY_MS)
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.render_delay),
        }
    }

    /// Set the reference store root
    pub fn with_reference_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reference_dir = dir.into();
        self
    }

    /// Set the failure store root
    pub fn with_failure_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.failure_dir = dir.into();
        self
    }

    /// Enable or disable record mode
    pub fn with_record_mode(mut self, record: bool) -> Self {
        self.record_mode = record;
        self
    }

    /// Set the tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the top crop band
    pub fn with_render_offset(mut self, offset: u32) -> Self {
        self.render_offset = offset;
        self
    }

    /// Set the default render delay
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::defaults();
        assert_eq!(settings.reference_dir, PathBuf::from(DEFAULT_REFERENCE_PATH));
        assert_eq!(settings.failure_dir, PathBuf::from(DEFAULT_FAILURE_PATH));
        assert!(!settings.record_mode);
        assert_eq!(settings.tolerance, 0.0);
        assert_eq!(settings.render_delay, Duration::from_millis(400));
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_REFERENCE_PATH, "/refs"),
            (ENV_FAILURE_PATH, "/fails"),
            (ENV_RECORD_MODE, "YES"),
            (ENV_TOLERANCE, "250.5"),
            (ENV_RENDER_OFFSET_Y, "44"),
            (ENV_RENDER_DELAY_MS, "10"),
        ]));
        assert_eq!(settings.reference_dir, PathBuf::from("/refs"));
        assert_eq!(settings.failure_dir, PathBuf::from("/fails"));
        assert!(settings.record_mode);
        assert_eq!(settings.tolerance, 250.5);
        assert_eq!(settings.render_offset, 44);
        assert_eq!(settings.render_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_RECORD_MODE, "nope"),
            (ENV_TOLERANCE, "-3"),
            (ENV_RENDER_OFFSET_Y, "tall"),
            (ENV_REFERENCE_PATH, ""),
        ]));
        assert_eq!(settings, Settings::defaults());
    }
}

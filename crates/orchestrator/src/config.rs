//! Pipeline configuration

use std::path::PathBuf;

/// Tunables for the conversion pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Seconds between extracted frames
    pub frame_interval_secs: f64,
    /// Cap on the candidate set handed to the frame selector
    pub candidate_cap: usize,
    /// Number of frames the deterministic fallback selects
    pub fallback_target: usize,
    /// Root for per-job intermediate artifacts
    pub work_dir: PathBuf,
    /// Root for per-job finished articles
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_interval_secs: 5.0,
            candidate_cap: 20,
            fallback_target: 6,
            work_dir: PathBuf::from("work"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PipelineConfig {
    /// Build the configuration from environment variables, falling back
    /// to the defaults for anything unset or unparsable
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            frame_interval_secs: env_parsed("FRAME_INTERVAL_SECS", defaults.frame_interval_secs),
            candidate_cap: env_parsed("CANDIDATE_CAP", defaults.candidate_cap),
            fallback_target: env_parsed("FALLBACK_TARGET", defaults.fallback_target),
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.frame_interval_secs, 5.0);
        assert_eq!(config.candidate_cap, 20);
        assert_eq!(config.fallback_target, 6);
    }
}

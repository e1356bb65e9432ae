//! Ingestion configuration

use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::defaults::POLL_PERIOD;
use crate::error::{Result, ShmLogError};
use crate::ring::CursorPolicy;
use crate::segment::SegmentConfig;

/// Everything the pump needs to know at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Segment to attach to
    pub segment: SegmentConfig,
    /// Fixed period between poll cycles
    #[serde(rename = "poll_period_ms", with = "duration_millis")]
    pub poll_period: Duration,
    /// Handling of misaligned cursors
    pub cursor_policy: CursorPolicy,
    /// Durable journal, if any
    pub journal_path: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            segment: SegmentConfig::default(),
            poll_period: POLL_PERIOD,
            cursor_policy: CursorPolicy::default(),
            journal_path: None,
        }
    }
}

impl IngestConfig {
    /// Configuration for the named segment with reference defaults
    pub fn new(segment_name: impl Into<String>) -> Self {
        Self {
            segment: SegmentConfig::new(segment_name),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ShmLogError::from_io(e, "Failed to read config file"))?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Set the segment configuration
    pub fn with_segment(mut self, segment: SegmentConfig) -> Self {
        self.segment = segment;
        self
    }

    /// Set the poll period
    pub fn with_poll_period(mut self, period: Duration) -> Self {
        self.poll_period = period;
        self
    }

    /// Set the cursor policy
    pub fn with_cursor_policy(mut self, policy: CursorPolicy) -> Self {
        self.cursor_policy = policy;
        self
    }

    /// Set the journal path
    pub fn with_journal(mut self, path: impl Into<PathBuf>) -> Self {
        self.journal_path = Some(path.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.segment.validate()?;

        if self.poll_period.is_zero() {
            return Err(ShmLogError::invalid_parameter(
                "poll_period",
                "Poll period must be greater than 0",
            ));
        }

        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{LOG_SIZE, SHMEM_SIZE};

    #[test]
    fn test_defaults_match_reference_sizing() {
        let config = IngestConfig::new("applog");
        assert_eq!(config.segment.size, SHMEM_SIZE);
        assert_eq!(config.segment.slot_size, LOG_SIZE);
        assert_eq!(config.poll_period, Duration::from_millis(100));
        assert_eq!(config.cursor_policy, CursorPolicy::BestEffort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = IngestConfig::default();
        // Empty name should fail
        assert!(config.validate().is_err());

        config.segment.name = "applog".to_string();
        config.poll_period = Duration::ZERO;
        assert!(config.validate().is_err());

        config.poll_period = Duration::from_millis(10);
        config.segment.slot_size = 0;
        assert!(config.validate().is_err());

        config.segment.slot_size = 256;
        config.segment.size = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_uses_millis() {
        let config = IngestConfig::new("applog")
            .with_poll_period(Duration::from_millis(250))
            .with_cursor_policy(CursorPolicy::FailClosed);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"poll_period_ms\":250"));
        assert!(json.contains("\"fail_closed\""));

        let partial: IngestConfig =
            serde_json::from_str(r#"{"segment":{"name":"other"},"poll_period_ms":50}"#).unwrap();
        assert_eq!(partial.segment.name, "other");
        assert_eq!(partial.segment.slot_size, LOG_SIZE);
        assert_eq!(partial.poll_period, Duration::from_millis(50));
    }
}

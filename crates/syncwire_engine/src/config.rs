//! Configuration for the sync engine.

use crate::error::{SyncError, SyncResult};

/// Default bound on data stream packets per run.
pub const DEFAULT_MAX_DATA_STREAM_PACKETS: u32 = 1024;

/// Configuration for a state machine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of exchange-data-stream packets one run may send or receive.
    pub max_data_stream_packets: u32,
}

impl EngineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            max_data_stream_packets: DEFAULT_MAX_DATA_STREAM_PACKETS,
        }
    }

    /// Sets the data stream bound.
    pub fn with_max_data_stream_packets(mut self, limit: u32) -> Self {
        self.max_data_stream_packets = limit;
        self
    }

    /// Checks that the configuration can drive a run.
    pub fn validate(&self) -> SyncResult<()> {
        if self.max_data_stream_packets == 0 {
            return Err(SyncError::InvalidConfig(
                "max_data_stream_packets must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

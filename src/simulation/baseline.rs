//! Fixed-mode baseline persistence
//!
//! When a fixed-timer run ends, its headline metrics are snapshotted to a
//! JSON file. Later adaptive runs read the snapshot back to report their
//! percentage improvement. A missing or corrupt file simply means no
//! baseline is available; it is never a simulation error.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Snapshot of a completed fixed-timer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedBaseline {
    pub avg_wait_time: f32,
    pub throughput: u32,
    pub total_cars: u32,
    pub simulation_time: f32,
}

impl FixedBaseline {
    /// Load a previously saved baseline. Absence or corruption yields
    /// `None` so the comparison feature is simply omitted.
    pub fn load(path: &Path) -> Option<FixedBaseline> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!("no baseline at {}: {}", path.display(), err);
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(baseline) => Some(baseline),
            Err(err) => {
                debug!("ignoring corrupt baseline at {}: {}", path.display(), err);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string(self).context("Failed to serialize baseline")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write baseline to {}", path.display()))?;
        Ok(())
    }

    /// Percentage improvement of an adaptive run's average wait over this
    /// baseline. `None` when the baseline wait is not positive.
    pub fn improvement_over(&self, adaptive_avg_wait: f32) -> Option<f32> {
        if self.avg_wait_time > 0.0 {
            Some((self.avg_wait_time - adaptive_avg_wait) / self.avg_wait_time * 100.0)
        } else {
            None
        }
    }
}

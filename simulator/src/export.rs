//! Trajectory export for `--save_fig`.
//!
//! Each experiment gets its own `<output_path>/<unix seconds>/` directory
//! holding one `Round_<i>.json` per round, the scenario it ran and the final
//! `experiment_stats.json`. Files are written to a temp path and renamed.

use anyhow::{Context, Result};
use engine_config::ScenarioConfig;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::report::RoundReport;
use crate::stats::ExperimentSnapshot;

pub const STATS_FILE: &str = "experiment_stats.json";
pub const SCENARIO_FILE: &str = "scenario.json";

pub fn round_file_name(round: u32) -> String {
    format!("Round_{round}.json")
}

/// Writes experiment artifacts into a timestamped directory.
#[derive(Debug, Clone)]
pub struct TrajectoryExporter {
    dir: PathBuf,
}

impl TrajectoryExporter {
    /// Create `<output_path>/<unix seconds>/`.
    pub fn create(output_path: &Path) -> Result<Self> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::create_in(&output_path.join(stamp.to_string()))
    }

    /// Use `dir` as is, creating it when missing.
    pub fn create_in(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        info!("Saving trajectories to {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_round(&self, report: &RoundReport) -> Result<PathBuf> {
        self.write_json(&round_file_name(report.round), report)
    }

    pub fn write_scenario(&self, config: &ScenarioConfig) -> Result<PathBuf> {
        self.write_json(SCENARIO_FILE, config)
    }

    pub fn write_stats(&self, snapshot: &ExperimentSnapshot) -> Result<PathBuf> {
        self.write_json(STATS_FILE, snapshot)
    }

    /// Serialize `value` to `<dir>/<name>` (atomic write-then-rename).
    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("failed to serialize {name}"))?;

        let temp_path = self.dir.join(format!("{name}.tmp"));
        let written = fs::File::create(&temp_path)
            .and_then(|mut file| file.write_all(json.as_bytes()))
            .and_then(|()| fs::rename(&temp_path, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("failed to write {}", path.display()));
        }

        debug!("Wrote {}", path.display());
        Ok(path)
    }
}

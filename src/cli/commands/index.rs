//! Implementation of the `healmap index` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{create_spinner, finish_success, output, CommandOutput};
use crate::domain::models::{Config, SnapshotFingerprint};
use crate::services::{IndexOrigin, IndexService};

#[derive(Debug, Serialize)]
pub struct IndexOutput {
    pub origin: IndexOrigin,
    pub passages: usize,
    pub fingerprint: SnapshotFingerprint,
    pub snapshot_path: PathBuf,
    pub index_path: PathBuf,
}

impl CommandOutput for IndexOutput {
    fn to_human(&self) -> String {
        let verb = match self.origin {
            IndexOrigin::Built => "Built",
            IndexOrigin::Reindexed => "Reindexed",
            IndexOrigin::Loaded | IndexOrigin::Cached => "Loaded",
        };
        [
            format!("{verb} index with {} passages", self.passages),
            format!("  Fingerprint: {}", self.fingerprint.short()),
            format!("  Snapshot:    {}", self.snapshot_path.display()),
            format!("  Index:       {}", self.index_path.display()),
        ]
        .join("\n")
    }
}

pub async fn execute(config: &Config, force: bool, json_mode: bool) -> Result<()> {
    let service =
        IndexService::from_config(config).context("Failed to set up the index service")?;

    let spinner = create_spinner(
        if force {
            "Rebuilding index..."
        } else {
            "Preparing index..."
        },
        json_mode,
    );
    let (index, origin) = match service.ensure(force).await {
        Ok(ready) => {
            finish_success(&spinner, format!("Index {}", ready.1));
            ready
        }
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).context("Failed to prepare index");
        }
    };

    let result = IndexOutput {
        origin,
        passages: index.len(),
        fingerprint: index.fingerprint().clone(),
        snapshot_path: service.store().snapshot_path().to_path_buf(),
        index_path: service.store().index_path().to_path_buf(),
    };
    output(&result, json_mode);
    Ok(())
}

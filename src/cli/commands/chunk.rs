//! Implementation of the `healmap chunk` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::{Config, Passage};
use crate::domain::ports::{DocumentSource, TextFileSource};
use crate::infrastructure::vector::Chunker;

#[derive(Debug, Serialize)]
pub struct ChunkOutput {
    pub file: PathBuf,
    pub max_len: usize,
    pub passages: Vec<Passage>,
}

impl CommandOutput for ChunkOutput {
    fn to_human(&self) -> String {
        if self.passages.is_empty() {
            return format!("{} contains no text.", self.file.display());
        }

        let mut table = list_table(&["id", "tokens", "preview"]);
        for passage in &self.passages {
            table.add_row(vec![
                passage.id.to_string(),
                passage.text.split_whitespace().count().to_string(),
                passage.preview(),
            ]);
        }
        format!(
            "{} passages of up to {} tokens from {}:\n{table}",
            self.passages.len(),
            self.max_len,
            self.file.display()
        )
    }
}

pub async fn execute(
    config: &Config,
    file: &Path,
    max_len: Option<usize>,
    json_mode: bool,
) -> Result<()> {
    let max_len = max_len.unwrap_or(config.chunking.max_len);
    let chunker = Chunker::new(max_len).context("Invalid --max-len")?;
    let text = TextFileSource::new(file)
        .load_text()
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    output(
        &ChunkOutput {
            file: file.to_path_buf(),
            max_len,
            passages: chunker.chunk_passages(&text),
        },
        json_mode,
    );
    Ok(())
}

//! Implementation of the `healmap search` command.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{list_table, output, truncate, CommandOutput};
use crate::domain::models::{Config, RetrievalHit};
use crate::services::{IndexService, Retriever};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub k: usize,
    pub hits: Vec<RetrievalHit>,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.hits.is_empty() {
            return "No passages found.".to_string();
        }

        let mut table = list_table(&["rank", "id", "distance", "passage"]);
        for (rank, hit) in self.hits.iter().enumerate() {
            table.add_row(vec![
                (rank + 1).to_string(),
                hit.passage.id.to_string(),
                format!("{:.4}", hit.distance),
                truncate(&hit.passage.text, PREVIEW_CHARS),
            ]);
        }
        format!("Top {} passages for \"{}\":\n{table}", self.hits.len(), self.query)
    }
}

pub async fn execute(config: &Config, query: &str, k: Option<usize>, json_mode: bool) -> Result<()> {
    let k = k.unwrap_or(config.retrieval.top_k);
    let service =
        IndexService::from_config(config).context("Failed to set up the index service")?;
    let index = service
        .load_or_build()
        .await
        .context("Failed to prepare index")?;

    let result = Retriever::new(service.embedder().clone())
        .search(&index, query, k)
        .await
        .context("Search failed")?;

    output(
        &SearchOutput {
            query: query.to_string(),
            k,
            hits: result.hits,
        },
        json_mode,
    );
    Ok(())
}

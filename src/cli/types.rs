//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "healmap")]
#[command(about = "Retrieval-augmented structured generation over a Chiron healing map", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .healmap/config.yaml layering)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the passage index, or load it if it is current
    Index {
        /// Rebuild even when the persisted snapshot is current
        #[arg(short, long)]
        force: bool,
    },

    /// Retrieve the passages nearest to a query
    Search {
        /// Free-text query
        query: String,

        /// Number of passages (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Generate a day-by-day healing plan
    Plan(PlacementArgs),

    /// Generate a thematic overview
    Overview(PlacementArgs),

    /// Generate a sectioned analysis
    Analysis(PlacementArgs),

    /// Split a text file into passages
    Chunk {
        /// UTF-8 text file
        file: PathBuf,

        /// Tokens per passage (defaults to chunking.max_len)
        #[arg(long)]
        max_len: Option<usize>,
    },
}

/// Placement and question shared by the generation commands
#[derive(Args, Debug, Clone)]
pub struct PlacementArgs {
    /// Question used as the retrieval query
    pub question: String,

    /// Zodiac sign of the Chiron placement
    #[arg(short, long)]
    pub sign: String,

    /// House of the Chiron placement
    #[arg(short = 'H', long)]
    pub house: String,

    /// Extra template parameter (repeatable)
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_with_params() {
        let cli = Cli::try_parse_from([
            "healmap",
            "--json",
            "plan",
            "--sign",
            "Aries",
            "-H",
            "1st",
            "--param",
            "language=en",
            "How do I heal?",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(args.sign, "Aries");
        assert_eq!(args.house, "1st");
        assert_eq!(args.params, vec![("language".to_string(), "en".to_string())]);
        assert_eq!(args.question, "How do I heal?");
    }

    #[test]
    fn test_generation_requires_sign_and_house() {
        assert!(Cli::try_parse_from(["healmap", "overview", "question"]).is_err());
    }

    #[test]
    fn test_key_value_parser() {
        assert_eq!(
            parse_key_value("tone=gentle=warm").unwrap(),
            ("tone".to_string(), "gentle=warm".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_search_k_and_index_force() {
        let cli = Cli::try_parse_from(["healmap", "search", "worth", "-k", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { k: Some(5), .. }));

        let cli = Cli::try_parse_from(["healmap", "index", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Index { force: true }));
    }
}

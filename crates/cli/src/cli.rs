use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Decide whether stats pages are served full, degraded, or not at all.
///
/// Reads aggregated statistics from PostgreSQL (or a JSON snapshot) and
/// prints each decision as JSON.
#[derive(Parser, Debug)]
#[command(name = "compass-check", version, about)]
pub struct CliArgs {
    /// Regulation format id (defaults to FORMAT_ID from the environment).
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Statistics month, e.g. 2025-01 (defaults to the latest in the store).
    #[arg(long, global = true, env = "COMPASS_BUCKET")]
    pub bucket: Option<String>,

    /// Read statistics from a JSON snapshot instead of PostgreSQL.
    #[arg(long, global = true, env = "COMPASS_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pair page, addressed by its `a-b` slug.
    Core { slug: String },

    /// Counter page, addressed by target or `how-to-beat-` slug.
    Counter { target: String },

    /// Archetype page.
    Archetype { slug: String },

    /// Split a pair slug into its two members without gating.
    Resolve { slug: String },
}

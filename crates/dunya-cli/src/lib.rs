//! Dunya CLI Library
//!
//! Command-line client for the Dunya docserver.
//!
//! # Overview
//!
//! - **Collections**: list the docserver collections (`dunya collections`)
//! - **Documents**: show a recording's source files and analysis output
//!   (`dunya document <mbid>`)
//! - **Downloads**: fetch a source or derived file (`dunya download`)
//! - **Status**: check that the server and its database are up (`dunya status`)
//!
//! Requests carry `Authorization: Token <key>` when a token is configured, so
//! restricted collections and staff-only files follow the token's tier.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod progress;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

/// Dunya - docserver client
#[derive(Parser, Debug)]
#[command(name = "dunya")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server URL
    #[arg(long, env = "DUNYA_SERVER_URL", default_value = config::DEFAULT_SERVER_URL, global = true)]
    pub server_url: String,

    /// API token
    #[arg(long, env = "DUNYA_API_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List docserver collections
    Collections,

    /// Show a document's source files and derived files
    Document {
        /// External identifier (MusicBrainz recording id)
        mbid: String,
    },

    /// Download a source or derived file
    Download {
        /// External identifier (MusicBrainz recording id)
        mbid: String,

        /// Source file type (e.g. mp3) or module slug (e.g. filehash)
        slug: String,

        /// Module output name
        #[arg(short, long)]
        subtype: Option<String>,

        /// Part number of a multi-part output
        #[arg(short, long)]
        part: Option<u32>,

        /// Module version (defaults to the latest)
        #[arg(short = 'V', long = "module-version")]
        version: Option<String>,

        /// Output file (defaults to the name the server sends)
        #[arg(short, long)]
        output: Option<String>,

        /// Expected SHA-256 of the file; the download is removed on mismatch
        #[arg(long)]
        sha256: Option<String>,
    },

    /// Check server health
    Status,
}

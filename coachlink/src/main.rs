//! Coachlink - pair coaches and students in shared video/chat sessions.
//!
//! Architecture:
//! - CLI is a thin client that talks to the coachlink server via HTTP
//! - Server owns the SQLite store (participants, assignments, activities)
//!   and the push client
//! - Session rooms live on an external communications platform; each client
//!   derives the room key deterministically from the participant pair, so
//!   both sides converge without coordination

mod cli;
mod config;
mod db;
mod identity;
mod models;
mod push;
mod server;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coachlink=info")),
        )
        .init();

    let cli = Cli::parse();
    execute(cli).await
}

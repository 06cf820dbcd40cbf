//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

/// Coachlink - pair coaches and students in shared video/chat sessions
#[derive(Parser, Debug)]
#[command(name = "coachlink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the coachlink server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "58412")]
        port: u16,
    },

    /// Show a participant's profile and entry flow
    Whoami {
        /// Participant ID
        id: String,
    },

    /// List a participant's partner candidates (role-gated)
    Partners {
        /// Participant ID
        id: String,
    },

    /// Start (or rejoin) a session with a partner
    Session {
        /// Your participant ID
        self_id: String,

        /// Partner to pair with (required for coaches, who must pick)
        #[arg(long)]
        partner: Option<String>,

        /// Open a chat channel instead of a video room
        #[arg(long)]
        chat: bool,

        /// Stay joined until Enter is pressed (otherwise join then leave)
        #[arg(long)]
        stay: bool,
    },

    /// List scheduled activities for a participant
    Activities {
        /// Participant ID
        participant_id: String,
    },

    /// Dispatch reminder notifications for an activity
    Remind {
        /// Activity ID
        activity_id: String,
    },

    /// List participants, assignments, or activities
    List {
        /// Entity type to list
        #[arg(value_enum)]
        entity: ListEntity,
    },

    /// Load demo data into the store
    Seed,
}

/// Entity types that can be listed
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListEntity {
    /// List participants
    Participants,
    /// List assignments
    Assignments,
    /// List activities
    Activities,
}

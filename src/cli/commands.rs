//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "daybook")]
#[command(about = "Personal journal with daily ratings, drafts and attachments", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new daybook
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Create an account and sign in
    Register {
        email: String,

        /// Password (falls back to DAYBOOK_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign in
    Login {
        email: String,

        /// Password (falls back to DAYBOOK_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out
    Logout,

    /// Request a password reset email
    ResetPassword { email: String },

    /// Show the signed-in account
    Whoami,

    /// Write an entry, or save it as a draft
    Write {
        /// Entry text (HTML allowed)
        content: Option<String>,

        /// Attach a file (repeatable)
        #[arg(short, long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,

        /// Rating for the day, 1 to 5
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=5))]
        rating: Option<u8>,

        /// Save as a draft instead of a final entry
        #[arg(short, long)]
        draft: bool,

        /// Continue an existing draft
        #[arg(long, value_name = "ID")]
        draft_id: Option<String>,
    },

    /// List entries
    List {
        /// Sort order (newest, oldest, highest, lowest)
        #[arg(short, long, default_value = "newest")]
        sort: String,

        /// Only show entries whose date matches (e.g. "october")
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one entry
    View { id: String },

    /// Delete an entry permanently
    Delete { id: String },

    /// Export an entry and its attachments to a directory
    Export {
        id: String,

        /// Destination directory (default: export_dir config or current directory)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Show ratings per day for a month
    Calendar {
        /// Month as YYYY-MM (default: current month)
        month: Option<String>,
    },

    /// Manage drafts
    Drafts {
        #[command(subcommand)]
        command: DraftCommands,
    },

    /// View or modify configuration
    Config {
        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommands {
    /// List drafts that have not expired
    List,

    /// Delete one draft
    Delete { id: String },

    /// Delete all drafts, expired ones included
    Clear,

    /// Save a draft as a final entry
    Promote {
        id: String,

        /// Rating to use if the draft has none
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=5))]
        rating: Option<u8>,
    },
}

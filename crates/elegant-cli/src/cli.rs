use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use elegant_core::export::ExportFormat as CoreExportFormat;
use elegant_core::models::{NoteColor, SortBy};

#[derive(Parser)]
#[command(name = "elegant")]
#[command(about = "Elegant Notes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the local notes snapshot
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "add")]
    New {
        /// Note title
        #[arg(long)]
        title: Option<String>,
        /// Note content (read from stdin when piped and omitted)
        #[arg(long)]
        content: Option<String>,
        /// Tag to attach (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// List notes
    List {
        /// Show archived notes instead of active ones
        #[arg(long)]
        archived: bool,
        /// Filter by text in title, content, or tags
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,
        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,
        /// Sort order (remembered for later runs)
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a note
    Show {
        /// Note ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a note (opens $EDITOR when no field is given)
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Duplicate a note
    Duplicate {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Pin or unpin a note
    Pin {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Archive or unarchive a note
    Archive {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Set a note's color
    Color {
        /// Note ID or unique ID prefix
        id: String,
        /// Color name
        #[arg(value_enum)]
        color: ColorArg,
    },
    /// Add or remove tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// List every tag in use
    Tags,
    /// Share or unshare a note publicly
    Share {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// View a publicly shared note
    View {
        /// Public share slug
        slug: String,
    },
    /// Sync local notes with your account
    Sync,
    /// Export notes
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormatArg::Json)]
        format: ExportFormatArg,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure the remote backend
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Authenticate with Supabase
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Add a tag to a note
    Add {
        /// Note ID or unique ID prefix
        id: String,
        /// Tag name
        tag: String,
    },
    /// Remove a tag from a note
    Remove {
        /// Note ID or unique ID prefix
        id: String,
        /// Tag name
        tag: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update the config file
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Base URL of the public share page
        #[arg(long, value_name = "URL")]
        share_base_url: Option<String>,
    },
    /// Print the resolved configuration
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show sign-in status
    Status,
    /// Sign out and clear the stored session
    Logout,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SortArg {
    Updated,
    Created,
    Title,
}

impl From<SortArg> for SortBy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Updated => Self::Updated,
            SortArg::Created => Self::Created,
            SortArg::Title => Self::Title,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ColorArg {
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
}

impl From<ColorArg> for NoteColor {
    fn from(value: ColorArg) -> Self {
        match value {
            ColorArg::Default => Self::Default,
            ColorArg::Red => Self::Red,
            ColorArg::Orange => Self::Orange,
            ColorArg::Yellow => Self::Yellow,
            ColorArg::Green => Self::Green,
            ColorArg::Blue => Self::Blue,
            ColorArg::Purple => Self::Purple,
            ColorArg::Pink => Self::Pink,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormatArg {
    Json,
    Markdown,
}

impl From<ExportFormatArg> for CoreExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Json => Self::Json,
            ExportFormatArg::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

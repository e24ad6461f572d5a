//! Elegant CLI - Elegant Notes from the terminal
//!
//! Notes live in a local snapshot and are mirrored to Supabase while signed in.

mod auth;
mod cli;
mod commands;
mod config_file;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::{read_piped_stdin, Workspace};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::export::run_export;
use crate::commands::list::{run_list, run_tags, ListOptions};
use crate::commands::new::{run_new, NewNote};
use crate::commands::organize::{run_archive, run_color, run_duplicate, run_pin, run_tag};
use crate::commands::share::{run_share, run_view};
use crate::commands::show::run_show;
use crate::commands::sync::run_sync;
use crate::config_file::require_remote_config;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("elegant=info")),
        )
        .init();

    let cli = Cli::parse();

    // Commands that never touch the local snapshot
    let command = match cli.command {
        Commands::Config { command } => return run_config(command),
        Commands::Auth { command } => return run_auth(command, cli.data_dir).await,
        Commands::Completions { shell, output } => {
            return run_completions(shell, output.as_deref());
        }
        Commands::View { slug } => return run_view(&require_remote_config()?, &slug).await,
        command => command,
    };

    let workspace = Workspace::open(cli.data_dir).await?;
    let result = run_with_workspace(command, &workspace).await;
    // Whatever already changed is persisted even when the command failed.
    workspace.close().await?;
    result
}

async fn run_with_workspace(command: Commands, workspace: &Workspace) -> Result<(), CliError> {
    let store = &workspace.store;
    match command {
        Commands::New {
            title,
            content,
            tags,
        } => {
            let content = match content {
                Some(content) => Some(content),
                None => read_piped_stdin()?,
            };
            run_new(
                store,
                NewNote {
                    title,
                    content,
                    tags,
                },
            )
            .await;
        }
        Commands::List {
            archived,
            search,
            tag,
            sort,
            json,
        } => run_list(
            store,
            ListOptions {
                archived,
                search,
                tag,
                sort: sort.map(Into::into),
                json,
            },
        )?,
        Commands::Show { id, json } => run_show(store, &id, json)?,
        Commands::Edit { id, title, content } => run_edit(store, &id, title, content)?,
        Commands::Delete { id } => run_delete(store, &id)?,
        Commands::Duplicate { id } => run_duplicate(store, &id)?,
        Commands::Pin { id } => run_pin(store, &id)?,
        Commands::Archive { id } => run_archive(store, &id)?,
        Commands::Color { id, color } => run_color(store, &id, color.into())?,
        Commands::Tag { command } => run_tag(store, command)?,
        Commands::Tags => run_tags(store),
        Commands::Share { id } => run_share(store, workspace.remote.as_ref(), &id).await?,
        Commands::Sync => {
            run_sync(workspace).await?;
        }
        Commands::Export { format, output } => {
            run_export(store, format.into(), output.as_deref())?;
        }
        Commands::Config { .. }
        | Commands::Auth { .. }
        | Commands::Completions { .. }
        | Commands::View { .. } => {
            unreachable!("dispatched before the workspace is opened")
        }
    }
    Ok(())
}

use std::path::PathBuf;

use elegant_core::sync::SyncCoordinator;

use crate::auth::{auth_client, clear_stored_session};
use crate::cli::AuthCommands;
use crate::commands::common::Workspace;
use crate::commands::sync::print_sync_report;
use crate::config_file::{load_remote_config, require_remote_config};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, data_dir: Option<PathBuf>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email, password } => {
            let config = require_remote_config()?;
            let session = auth_client(&config)?.sign_in(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in as {email_label}");

            // First sign-in migrates local notes into the account.
            let workspace = Workspace::open(data_dir).await?;
            let coordinator = SyncCoordinator::new(workspace.state_dir.clone());
            let result = coordinator.run(&workspace.store).await;
            workspace.close().await?;
            match result {
                Ok(report) => print_sync_report(&report),
                Err(error) => {
                    tracing::warn!("Initial sync failed: {}", error);
                    println!("Initial sync failed; run `elegant sync` to retry");
                }
            }
            Ok(())
        }
        AuthCommands::Status => {
            let Some(config) = load_remote_config()? else {
                println!("Remote is not configured; running local-only.");
                return Ok(());
            };
            match auth_client(&config)?.restore_session().await? {
                Some(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!(
                        "Signed in as {} (expires_at={})",
                        email_label, session.expires_at
                    );
                }
                None => println!("Not signed in."),
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let Some(config) = load_remote_config()? else {
                clear_stored_session()?;
                println!("Signed out");
                return Ok(());
            };
            let client = auth_client(&config)?;
            match client.restore_session().await? {
                Some(session) => {
                    if let Err(error) = client.sign_out(&session.access_token).await {
                        tracing::warn!("Remote sign-out failed: {}", error);
                        clear_stored_session()?;
                    }
                }
                None => clear_stored_session()?,
            }
            println!("Signed out");
            Ok(())
        }
    }
}

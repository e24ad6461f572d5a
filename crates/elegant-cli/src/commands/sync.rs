use elegant_core::sync::{SyncCoordinator, SyncReport};

use crate::commands::common::Workspace;
use crate::error::CliError;

pub async fn run_sync(workspace: &Workspace) -> Result<SyncReport, CliError> {
    if workspace.remote.is_none() {
        return Err(CliError::RemoteNotConfigured);
    }

    let coordinator = SyncCoordinator::new(workspace.state_dir.clone());
    let report = coordinator.run(&workspace.store).await?;
    if !report.authenticated {
        return Err(CliError::Auth(
            "Not signed in. Run `elegant auth login --email <EMAIL> --password <PASSWORD>`."
                .to_string(),
        ));
    }

    print_sync_report(&report);
    Ok(report)
}

pub fn print_sync_report(report: &SyncReport) {
    if report.skipped_upload {
        println!("Local notes already migrated");
    } else if report.failed > 0 {
        println!(
            "Uploaded {} local notes ({} failed)",
            report.uploaded, report.failed
        );
    } else {
        println!("Uploaded {} local notes", report.uploaded);
    }
    println!("Sync completed: {} notes", report.fetched);
}

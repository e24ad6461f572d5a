use std::path::Path;

use elegant_core::export::{render_notes_export, ExportFormat};
use elegant_core::NoteStore;

use crate::error::CliError;

pub fn run_export(
    store: &NoteStore,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let rendered = render_notes_export(&store.notes(), format)?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

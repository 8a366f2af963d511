//! Ask command: request a second opinion and store it on the entry.

use crate::cli::AskArgs;
use crate::error::{Error, Result};
use crate::model::Backend;
use crate::opinion::create_backend;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use super::open_storage;

#[derive(Serialize)]
struct AskOutput<'a> {
    id: &'a str,
    backend: Backend,
    model: &'a str,
    response: &'a str,
}

/// Execute the ask command.
///
/// The entry is looked up before any network call, so an unknown id never
/// costs a request. The response is written to the backend's own column;
/// other stored responses are untouched.
///
/// # Errors
///
/// Returns `ContextNotFound`, `MissingCredential`, backend errors, or any
/// storage error.
pub fn execute(args: &AskArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let entry = storage
        .get_context(&args.id)?
        .ok_or_else(|| Error::ContextNotFound {
            id: args.id.clone(),
        })?;

    let backend = create_backend(args.backend, args.api_key.as_deref(), args.model.as_deref())?;
    info!(
        id = %entry.id,
        backend = backend.backend().as_str(),
        model = backend.model(),
        "Requesting opinion"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    let response = rt.block_on(backend.get_opinion(&entry, args.question.as_deref()))?;

    storage.update_response(&entry.id, backend.backend(), &response)?;

    if json {
        let output = AskOutput {
            id: &entry.id,
            backend: backend.backend(),
            model: backend.model(),
            response: &response,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        use colored::Colorize;
        println!(
            "{}",
            format!("{} ({}) on \"{}\"", backend.backend().display_name(), backend.model(), entry.title)
                .green()
                .bold()
        );
        println!();
        println!("{response}");
    }

    Ok(())
}

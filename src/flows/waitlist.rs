use crate::flows::{validate_email, validate_name};
use crate::store::{ResilientWriter, WriteOutcome, WriteRequest, server_timestamp};
use anyhow::{Result, bail};
use serde_json::{Map, Value};

/// Join the waitlist: one resilient write to the waitlist collection, one
/// terminal notification either way.
pub async fn run(
    writer: &ResilientWriter,
    collection: &str,
    name: &str,
    email: &str,
) -> Result<()> {
    validate_name(name)?;
    validate_email(email)?;

    let request = WriteRequest::new(collection, waitlist_payload(name, email));
    match writer.write(&request).await {
        WriteOutcome::Success { document_id } => {
            tracing::info!(document_id, "waitlist signup stored");
            println!("✅ Successfully joined the waitlist!");
            println!("🎓 Welcome to onboarding, {name}!");
            println!("Next: nexgenu onboarding --name \"{name}\"");
            Ok(())
        }
        WriteOutcome::Failure {
            last_error,
            ..
        } => {
            bail!(
                "{code}: {message} — check store.project_id, make sure the document store is \
                 enabled for the project, and if you are behind a corporate proxy note that the \
                 long-polling fallback transport has already been attempted.",
                code = last_error.code.as_deref().unwrap_or("error"),
                message = last_error.message
            )
        }
    }
}

fn waitlist_payload(name: &str, email: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("name".into(), Value::String(name.trim().to_string()));
    payload.insert("email".into(), Value::String(email.trim().to_string()));
    payload.insert("joined_at".into(), server_timestamp());
    payload
}

pub mod auth;
pub mod delete;
pub mod edit;
pub mod events;
pub mod new;
pub mod status;
pub mod view;

use anyhow::Result;
use calapp_core::{CalAppError, EventDraft};

/// Reject drafts the server would store as nonsense.
pub fn check_draft(draft: &EventDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        anyhow::bail!("Title can't be empty");
    }
    if draft.end <= draft.start {
        anyhow::bail!("End must be after start");
    }
    Ok(())
}

/// Server-side failures read as "Could not <action>: <server message>";
/// anything local keeps its own description.
pub fn failed_to(action: &str, err: CalAppError) -> anyhow::Error {
    if err.is_gateway_failure() {
        anyhow::anyhow!("Could not {}: {}", action, err.user_message())
    } else {
        anyhow::Error::new(err).context(format!("Could not {}", action))
    }
}

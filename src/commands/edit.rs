use anyhow::Result;
use calapp_core::{CalAppError, EventId};
use dialoguer::Input;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::commands::{check_draft, failed_to};
use crate::commands::new::prompt_with_retry;
use crate::render;
use crate::utils::time;

pub async fn run(
    app: &App,
    id: String,
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let me = app.signed_in().await?;
    let id = EventId::new(id);

    app.events
        .set_active_event(Some(id.clone()))
        .await
        .map_err(not_found)?;
    let event = app
        .store
        .read(|s| s.calendar.active_event().cloned())
        .await
        .ok_or_else(|| not_found(CalAppError::UnknownEvent(id.to_string())))?;

    let mut draft = event.to_draft();
    let interactive = title.is_none() && start.is_none() && end.is_none() && notes.is_none();

    if interactive {
        render::print_event(&event, &me);
        println!();

        draft.title = Input::new()
            .with_prompt("  Title")
            .default(draft.title)
            .interact_text()?;
        let current_start = draft.start;
        draft.start = prompt_with_retry(
            &format!("  Start ({})", format_local(current_start)),
            |input| keep_or_parse(input, current_start),
        )?;
        let current_end = draft.end;
        draft.end = prompt_with_retry(
            &format!("  End ({})", format_local(current_end)),
            |input| keep_or_parse(input, current_end),
        )?;
        draft.notes = Input::new()
            .with_prompt("  Notes")
            .default(draft.notes)
            .allow_empty(true)
            .interact_text()?;
    } else {
        if let Some(t) = title {
            draft.title = t;
        }
        if let Some(s) = start {
            // Keep the length when only the start moves
            let length = draft.end - draft.start;
            draft.start = time::parse_when(&s)?;
            if end.is_none() {
                draft.end = draft.start + length;
            }
        }
        if let Some(e) = end {
            draft.end = time::parse_when(&e)?;
        }
        if let Some(n) = notes {
            draft.notes = n;
        }
    }

    check_draft(&draft)?;

    app.events
        .save_event(&draft)
        .await
        .map_err(|e| failed_to("update event", e))?;

    println!("{}", format!("  Updated: {}", draft.title).green());
    Ok(())
}

fn keep_or_parse(
    input: &str,
    current: chrono::DateTime<chrono::Utc>,
) -> Result<chrono::DateTime<chrono::Utc>> {
    if input.trim() == "." {
        Ok(current)
    } else {
        time::parse_when(input)
    }
}

fn format_local(time: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "{}, \".\" keeps it",
        time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
    )
}

pub(crate) fn not_found(err: CalAppError) -> anyhow::Error {
    match err {
        CalAppError::UnknownEvent(id) => anyhow::anyhow!(
            "No event with id '{}'.\n\nList events with:\n  calapp events --view agenda",
            id
        ),
        other => other.into(),
    }
}

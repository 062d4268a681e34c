use anyhow::{Context, Result};
use calapp_core::EventId;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::commands::edit::not_found;
use crate::commands::failed_to;
use crate::render;

pub async fn run(app: &App, id: String, force: bool) -> Result<()> {
    let me = app.signed_in().await?;

    app.events
        .set_active_event(Some(EventId::new(id)))
        .await
        .map_err(not_found)?;
    let state = app.store.snapshot().await;
    if !state.calendar.has_event_selected() {
        anyhow::bail!("Nothing selected");
    }
    let event = state.calendar.active_event().cloned().context("Selected event is gone")?;

    if !force {
        render::print_event(&event, &me);
        println!();
        let confirmed = Confirm::new()
            .with_prompt("  Delete this event?")
            .default(false)
            .interact()?;
        if !confirmed {
            app.events.set_active_event(None).await?;
            println!("{}", "  Kept".dimmed());
            return Ok(());
        }
    }

    app.events
        .delete_active_event()
        .await
        .map_err(|e| failed_to("delete event", e))?;

    println!("{}", format!("  Deleted: {}", event.title).green());
    Ok(())
}

use anyhow::Result;
use calapp_core::event::CalendarEvent;
use calapp_core::storage::ClientStorage;
use calapp_core::view::CalendarView;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render;
use crate::utils::time;

pub async fn run(app: &App, view: Option<CalendarView>, date: Option<String>) -> Result<()> {
    let me = app.signed_in().await?;

    // An explicit view becomes the new default, like switching tabs
    let view = match view {
        Some(view) => {
            app.storage.set_last_view(view)?;
            view
        }
        None => app.storage.last_view()?.unwrap_or_default(),
    };

    let day = time::parse_day(date.as_deref())?;
    let range = view.range(day);

    let state = app.store.snapshot().await;
    if state.calendar.is_loading_events() {
        anyhow::bail!("Events have not been loaded yet");
    }
    let mut events: Vec<&CalendarEvent> = state
        .calendar
        .events()
        .iter()
        .filter(|event| range.overlaps(event))
        .collect();
    events.sort_by_key(|event| (event.start, event.end));

    let (first, last) = view.days(day);
    println!(
        "{} {}",
        view.to_string().bold(),
        format!("{} to {}", first.format("%b %-d"), last.format("%b %-d")).dimmed()
    );
    println!();
    render::print_events(&events, &me);

    Ok(())
}

use calapp_core::event::CalendarEvent;
use calapp_core::user::User;
use chrono::{DateTime, Local, NaiveDate, Utc};
use owo_colors::OwoColorize;

/// Print events grouped by local day. Events owned by `me` are highlighted.
pub fn print_events(events: &[&CalendarEvent], me: &User) {
    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return;
    }

    let mut current_date: Option<NaiveDate> = None;

    for event in events {
        let date = local_date(&event.start);
        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(date).bold());
            current_date = Some(date);
        }

        let time = format!("{}-{}", format_time(&event.start), format_time(&event.end));
        if event.is_owned_by(me) {
            println!("  {} {} {}", time, event.title.cyan().bold(), event.id.dimmed());
        } else {
            let owner = format!("[{}]", event.owner.name);
            println!("  {} {} {} {}", time, event.title, owner.dimmed(), event.id.dimmed());
        }
    }
}

/// Print one event with its notes.
pub fn print_event(event: &CalendarEvent, me: &User) {
    println!("  {}", event.title.bold());
    println!(
        "  {} {} {}",
        format_date_label(local_date(&event.start)),
        format_time(&event.start),
        format!("to {}", format_time(&event.end)).dimmed()
    );
    if !event.notes.is_empty() {
        println!("  {}", event.notes);
    }
    if !event.is_owned_by(me) {
        println!("  {}", format!("by {}", event.owner.name).dimmed());
    }
}

fn local_date(time: &DateTime<Utc>) -> NaiveDate {
    time.with_timezone(&Local).date_naive()
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
fn format_date_label(date: NaiveDate) -> String {
    let today = Local::now().date_naive();
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%H:%M").to_string()
}

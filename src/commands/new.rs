use anyhow::Result;
use calapp_core::EventDraft;
use chrono::{DateTime, Duration, Utc};
use dialoguer::Input;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::commands::{check_draft, failed_to};
use crate::utils::time;

pub async fn run(
    app: &App,
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    duration: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    app.signed_in().await?;
    let interactive = title.is_none() || start.is_none();

    let title = match title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .interact_text()?,
    };

    let start = match start {
        Some(s) => time::parse_when(&s)?,
        None => prompt_with_retry("  When?", time::parse_when)?,
    };

    let end = if let Some(e) = end {
        time::parse_when(&e)?
    } else if let Some(d) = duration {
        start + time::parse_duration(&d)?
    } else if interactive {
        prompt_end(start)?
    } else {
        start + Duration::hours(1)
    };

    let notes = match notes {
        Some(n) => n,
        None if interactive => Input::new()
            .with_prompt("  Notes? (skip)")
            .default(String::new())
            .show_default(false)
            .interact_text()?,
        None => String::new(),
    };

    let mut draft = EventDraft::new(title, start, end);
    draft.notes = notes;
    check_draft(&draft)?;

    let outcome = app
        .events
        .save_event(&draft)
        .await
        .map_err(|e| failed_to("create event", e))?;

    if interactive {
        println!();
    }
    println!(
        "{} {}",
        format!("  Created: {}", draft.title).green(),
        outcome.id().dimmed()
    );

    Ok(())
}

/// Prompt the user with retry on parse errors.
pub fn prompt_with_retry<F>(prompt: &str, parse: F) -> Result<DateTime<Utc>>
where
    F: Fn(&str) -> Result<DateTime<Utc>>,
{
    loop {
        let input: String = Input::new().with_prompt(prompt).interact_text()?;
        match parse(&input) {
            Ok(result) => return Ok(result),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}

/// Ask how long the event lasts. Empty input means one hour.
fn prompt_end(start: DateTime<Utc>) -> Result<DateTime<Utc>> {
    loop {
        let input: String = Input::new()
            .with_prompt("  How long? (1 hour)")
            .default(String::new())
            .show_default(false)
            .interact_text()?;
        if input.is_empty() {
            return Ok(start + Duration::hours(1));
        }
        match time::parse_duration(&input).or_else(|_| time::parse_when(&input).map(|end| end - start)) {
            Ok(length) => return Ok(start + length),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}

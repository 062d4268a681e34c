use anyhow::Result;
use calapp_core::storage::ClientStorage;
use calapp_core::view::CalendarView;
use owo_colors::OwoColorize;

use crate::app::App;

pub fn run(app: &App, view: Option<CalendarView>) -> Result<()> {
    match view {
        Some(view) => {
            app.storage.set_last_view(view)?;
            println!("{}", format!("  Default view set to {}", view).green());
        }
        None => {
            let current = app.storage.last_view()?.unwrap_or_default();
            for view in CalendarView::ALL {
                if view == current {
                    println!("{} {}", "*".green(), view.bold());
                } else {
                    println!("  {}", view);
                }
            }
        }
    }
    Ok(())
}

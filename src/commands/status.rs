use anyhow::Result;
use calapp_core::storage::ClientStorage;
use owo_colors::OwoColorize;

use crate::app::App;

pub async fn run(app: &App) -> Result<()> {
    app.restore_session().await;
    let state = app.store.snapshot().await;

    match state.session.user() {
        Some(user) if state.session.is_authenticated() => {
            println!("{} {}", "Signed in as".dimmed(), user.name.bold());
            println!("{} {}", "User id".dimmed(), user.id);
        }
        _ => println!("{}", "Not signed in".yellow()),
    }

    let view = app.storage.last_view()?.unwrap_or_default();
    println!("{} {}", "Default view".dimmed(), view);
    println!("{} {}", "Storage".dimmed(), app.storage.path().display());

    Ok(())
}

use anyhow::Result;
use calapp_core::controller::{LOGIN_FAILED_MESSAGE, register_failure_message};
use calapp_core::gateway::{Credentials, Profile};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::utils::tui;

pub async fn login(app: &App, email: Option<String>) -> Result<()> {
    let email = tui::text_or_prompt(email, "Email")?;
    let password = tui::prompt_password("Password")?;

    let spinner = tui::create_spinner("Signing in".to_string());
    let result = app.session.login(&Credentials { email, password }).await;
    spinner.finish_and_clear();

    match result {
        Ok(user) => {
            println!("{}", format!("  Signed in as {}", user.name).green());
            Ok(())
        }
        Err(_) => anyhow::bail!("{}", LOGIN_FAILED_MESSAGE),
    }
}

pub async fn register(app: &App, name: Option<String>, email: Option<String>) -> Result<()> {
    let name = tui::text_or_prompt(name, "Name")?;
    let email = tui::text_or_prompt(email, "Email")?;
    let password = tui::prompt_password("Password")?;
    let repeated = tui::prompt_password("Repeat password")?;
    if password != repeated {
        anyhow::bail!("Passwords don't match");
    }

    let spinner = tui::create_spinner("Creating account".to_string());
    let result = app
        .session
        .register(&Profile {
            name,
            email,
            password,
        })
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(user) => {
            println!("{}", format!("  Welcome, {}", user.name).green());
            Ok(())
        }
        Err(err) => anyhow::bail!("{}", register_failure_message(&err)),
    }
}

pub async fn logout(app: &App) -> Result<()> {
    app.session.logout().await?;
    println!("{}", "  Signed out".green());
    Ok(())
}

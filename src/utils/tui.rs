use anyhow::{Context, Result};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Use `value` if given, otherwise ask for it.
pub fn text_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new()
            .with_prompt(format!("  {}", label))
            .interact_text()?),
    }
}

/// Prompt the user for password input (hidden).
pub fn prompt_password(label: &str) -> Result<String> {
    let prompt = format!("  {}: ", label);
    rpassword::prompt_password(&prompt).context("Failed to read password")
}

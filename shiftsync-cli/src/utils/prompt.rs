use std::io::{self, Write};

use anyhow::{Context, Result};

/// Prompt for a line of text, falling back to `default` on empty input.
pub fn text(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) if !d.is_empty() => print!("{label} [{d}]: "),
        _ => print!("{label}: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim();
    if input.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(input.to_string())
    }
}

/// Prompt for a secret without echoing it.
pub fn password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label}: ")).context("Failed to read password")
}

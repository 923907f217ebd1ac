//! Passwords live in the OS keyring, never in config.toml.

use anyhow::{Context, Result, anyhow};

pub const SHIFTWEB_SERVICE: &str = "shiftsync-web";
pub const CALDAV_SERVICE: &str = "shiftsync-caldav";

pub fn get(service: &str, account: &str) -> Result<Option<String>> {
    let entry = keyring::Entry::new(service, account)?;
    match entry.get_password() {
        Ok(pw) => Ok(Some(pw)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {service} password for {account}")),
    }
}

pub fn set(service: &str, account: &str, password: &str) -> Result<()> {
    let entry = keyring::Entry::new(service, account)?;
    entry
        .set_password(password)
        .with_context(|| format!("Failed to store {service} password for {account}"))
}

/// Like [`get`], but a missing password is an error pointing at `setup`.
pub fn require(service: &str, account: &str) -> Result<String> {
    get(service, account)?.ok_or_else(|| {
        anyhow!(
            "No password stored for {account} ({service}).\n\n\
            Store it with:\n  \
            shiftsync setup"
        )
    })
}

//! CLI subcommands

pub mod audits;
pub mod auth;
pub mod completions;
pub mod config;
pub mod users;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use auditdesk_core::usecases::StoreError;
use thiserror::Error;

/// A failure the notifier has already shown to the operator
///
/// `main` exits non-zero without printing it a second time.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Reported(pub StoreError);

/// Wraps a use-case error for `?`, marking remote failures as reported
///
/// Use cases notify on every remote failure but return validation errors
/// silently, so only the latter still need printing.
pub fn store_error(err: StoreError) -> anyhow::Error {
    if err.operation().is_some() {
        Reported(err).into()
    } else {
        err.into()
    }
}

/// Environment variable consulted before prompting for a password
pub const PASSWORD_ENV: &str = "AUDITDESK_PASSWORD";

/// Takes the password from the flag, then `AUDITDESK_PASSWORD`, then stdin
pub fn resolve_password(flag: Option<&str>) -> Result<String> {
    if let Some(password) = flag {
        return Ok(password.to_string());
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush().ok();
    read_password_line(&mut io::stdin().lock())
}

fn read_password_line(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

//! Auth commands - Login, Logout, and Status against the AuditDesk backend
//!
//! Provides the `auditdesk auth` CLI subcommands which:
//! 1. `login`  - Exchanges username and password for a session and stores it
//!    in the system keyring (or the fallback session file).
//! 2. `logout` - Forgets the stored session.
//! 3. `status` - Shows who is logged in and against which backend.

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use auditdesk_core::ports::Credentials;

use super::resolve_password;
use crate::context::CliContext;
use crate::output::OutputFormatter;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in with username and password
    Login {
        /// Account username
        #[arg(long, short)]
        username: String,
        /// Password; read from AUDITDESK_PASSWORD or stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in account
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        match self {
            AuthCommand::Login { username, password } => {
                self.execute_login(ctx, username, password.as_deref(), &*fmt)
                    .await
            }
            AuthCommand::Logout => self.execute_logout(ctx, &*fmt),
            AuthCommand::Status => self.execute_status(ctx, &*fmt),
        }
    }

    async fn execute_login(
        &self,
        ctx: &CliContext,
        username: &str,
        password: Option<&str>,
        fmt: &dyn OutputFormatter,
    ) -> Result<()> {
        let password = resolve_password(password)?;
        let auth = ctx.auth()?;

        info!(username, base_url = %ctx.config().api.base_url, "Logging in");
        let session = auth.login(&Credentials::new(username, password)).await?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "success": true,
                "user_id": session.user_id(),
                "username": session.username(),
                "role": session.role(),
            }));
        } else {
            fmt.success(&format!(
                "Logged in as {} ({})",
                session.username(),
                session.role()
            ));
        }
        Ok(())
    }

    fn execute_logout(&self, ctx: &CliContext, fmt: &dyn OutputFormatter) -> Result<()> {
        let had_session = ctx.auth()?.logout()?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "success": true,
                "had_session": had_session,
            }));
        } else if had_session {
            fmt.success("Logged out successfully");
        } else {
            fmt.info("No stored session. Nothing to log out.");
        }
        Ok(())
    }

    fn execute_status(&self, ctx: &CliContext, fmt: &dyn OutputFormatter) -> Result<()> {
        let session = ctx.auth()?.current()?;
        let base_url = &ctx.config().api.base_url;

        if ctx.is_json() {
            let json = match &session {
                Some(session) => serde_json::json!({
                    "authenticated": true,
                    "user_id": session.user_id(),
                    "username": session.username(),
                    "role": session.role(),
                    "logged_in_at": session.logged_in_at().to_rfc3339(),
                    "base_url": base_url,
                }),
                None => serde_json::json!({
                    "authenticated": false,
                    "base_url": base_url,
                }),
            };
            fmt.print_json(&json);
            return Ok(());
        }

        match session {
            Some(session) => {
                fmt.success(&format!("Logged in as {}", session.username()));
                fmt.info(&format!("User ID:   {}", session.user_id()));
                fmt.info(&format!("Role:      {}", session.role()));
                fmt.info(&format!(
                    "Since:     {}",
                    session.logged_in_at().format("%Y-%m-%d %H:%M:%S UTC")
                ));
                fmt.info(&format!("Backend:   {}", base_url));
            }
            None => {
                fmt.info("Authentication status: Not logged in");
                fmt.info("Run 'auditdesk auth login --username <name>' to log in");
            }
        }
        Ok(())
    }
}

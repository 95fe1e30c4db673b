//! Users commands - account administration (admin role only)

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use auditdesk_core::domain::{Role, UserAccount, UserDraft, UserId, UserUpdate};

use super::{resolve_password, store_error};
use crate::context::CliContext;
use crate::output::OutputFormatter;

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List user accounts
    List {
        /// Case-insensitive text matched against every field
        #[arg(long, short)]
        search: Option<String>,
        /// Print only the usernames that can be assigned responsibility
        #[arg(long)]
        usernames: bool,
    },
    /// Create a user account
    Create(CreateArgs),
    /// Change fields of a user account
    Update(UpdateArgs),
    /// Delete a user account
    Delete {
        /// User ID
        id: UserId,
    },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub company: String,
    #[arg(long, default_value = "")]
    pub plant: String,
    #[arg(long, default_value = "")]
    pub gen_id: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub department: String,
    /// user, manager or admin
    #[arg(long, default_value = "user")]
    pub role: Role,
    /// Read from AUDITDESK_PASSWORD or stdin when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// User ID
    pub id: UserId,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub plant: Option<String>,
    #[arg(long)]
    pub gen_id: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub role: Option<Role>,
    /// New password; blank keeps the current one
    #[arg(long)]
    pub password: Option<String>,
}

impl CreateArgs {
    fn into_draft(self, password: String) -> UserDraft {
        UserDraft {
            company_name: self.company,
            plant_name: self.plant,
            username: self.username,
            gen_id: self.gen_id,
            password,
            email: self.email,
            department: self.department,
            role: self.role,
        }
    }
}

impl From<&UpdateArgs> for UserUpdate {
    fn from(args: &UpdateArgs) -> Self {
        UserUpdate {
            company_name: args.company.clone(),
            plant_name: args.plant.clone(),
            username: args.username.clone(),
            gen_id: args.gen_id.clone(),
            password: args.password.clone(),
            email: args.email.clone(),
            department: args.department.clone(),
            role: args.role,
        }
    }
}

impl UsersCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let fmt = ctx.formatter();
        let session = ctx.require_session()?;
        let mut admin = ctx.user_admin()?;

        match self {
            UsersCommand::List { search, usernames } => {
                admin.list(&session).await.map_err(store_error)?;
                if usernames {
                    let names = admin.responsibility_options();
                    if ctx.is_json() {
                        fmt.print_json(&serde_json::json!({ "usernames": names }));
                    } else {
                        for name in names {
                            fmt.info(name);
                        }
                    }
                    return Ok(());
                }
                let users = admin.search(search.as_deref().unwrap_or(""));
                print_users(ctx, &*fmt, &users);
                Ok(())
            }
            UsersCommand::Create(args) => {
                let password = resolve_password(args.password.as_deref())?;
                let draft = args.into_draft(password);
                info!(username = %draft.username, role = %draft.role, "Creating user");
                let username = draft.username.clone();
                admin.create(&session, draft).await.map_err(store_error)?;
                report_done(ctx, &*fmt, &format!("Created user {username}"));
                Ok(())
            }
            UsersCommand::Update(args) => {
                let update = UserUpdate::from(&args);
                info!(id = %args.id, "Updating user");
                admin
                    .update(&session, args.id, update)
                    .await
                    .map_err(store_error)?;
                report_done(ctx, &*fmt, &format!("Updated user {}", args.id));
                Ok(())
            }
            UsersCommand::Delete { id } => {
                info!(%id, "Deleting user");
                admin.delete(&session, id).await.map_err(store_error)?;
                report_done(ctx, &*fmt, &format!("Deleted user {id}"));
                Ok(())
            }
        }
    }
}

// The use case already announced success; JSON callers still get a result
fn report_done(ctx: &CliContext, fmt: &dyn OutputFormatter, message: &str) {
    if ctx.is_json() {
        fmt.print_json(&serde_json::json!({ "success": true, "message": message }));
    }
}

fn print_users(ctx: &CliContext, fmt: &dyn OutputFormatter, users: &[&UserAccount]) {
    if ctx.is_json() {
        fmt.print_json(&serde_json::json!({
            "count": users.len(),
            "users": users,
        }));
        return;
    }

    if users.is_empty() {
        fmt.info("No matching users");
        return;
    }

    fmt.info(&format!(
        "{:>5}  {:<16}  {:<8}  {:<20}  {:<12}  {}",
        "ID", "Username", "Role", "Company", "Department", "Email"
    ));
    for user in users {
        fmt.info(&format!(
            "{:>5}  {:<16}  {:<8}  {:<20}  {:<12}  {}",
            user.id.to_string(),
            user.username,
            user.role.to_string(),
            user.company_name.as_deref().unwrap_or("-"),
            user.department.as_deref().unwrap_or("-"),
            user.email.as_deref().unwrap_or("-"),
        ));
    }
    fmt.info(&format!("{} user(s)", users.len()));
}

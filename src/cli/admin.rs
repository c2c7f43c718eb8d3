use clap::Parser;
use error_stack::{Report, Result, ResultExt};
use thiserror::Error;

use huddle::schema::channel::MembershipChange;
use huddle::schema::user::BackfillDefaults;
use huddle::schema::{Channel, User};
use huddle::types::id::{marker::ChannelMarker, marker::UserMarker, Id};
use huddle::types::validation::is_valid_password;
use huddle::{config, App};

#[derive(Debug, Error)]
#[error("Could not run admin command")]
pub struct AdminError;

/// Parameterized maintenance commands. Each one opens the pool,
/// runs a fixed sequence against the stores, prints the outcome
/// and exits; nothing is hard-coded.
#[derive(Debug, Parser)]
pub struct AdminCommand {
    #[clap(subcommand)]
    pub action: AdminAction,
}

#[derive(Debug, Parser)]
pub enum AdminAction {
    /// User record maintenance
    #[clap(subcommand)]
    User(UserAction),
    /// Channel and membership maintenance
    #[clap(subcommand)]
    Channel(ChannelAction),
}

#[derive(Debug, Parser)]
pub enum UserAction {
    /// Print one user record looked up by e-mail
    Show {
        #[clap(long)]
        email: String,
        /// Also match soft-deleted accounts
        #[clap(long)]
        include_deleted: bool,
    },
    /// Clear the soft-delete marker of an account
    Restore {
        #[clap(long)]
        email: String,
    },
    /// Set the soft-delete marker of an account
    SoftDelete {
        #[clap(long)]
        email: String,
    },
    /// Overwrite the password of a live account
    ResetPassword {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    /// Fill absent optional profile fields with defaults; already
    /// populated fields are left alone
    BackfillDefaults {
        #[clap(long)]
        department: Option<String>,
        #[clap(long)]
        timezone: Option<String>,
        #[clap(long)]
        language: Option<String>,
        /// Derive missing display names from the e-mail local part
        #[clap(long)]
        display_names: bool,
    },
}

#[derive(Debug, Parser)]
pub enum ChannelAction {
    /// List channels ordered by name
    List {
        #[clap(long)]
        include_deleted: bool,
    },
    /// Add a user to a channel (no-op when already a member)
    AddMember {
        #[clap(long)]
        channel: Id<ChannelMarker>,
        #[clap(long)]
        user: Id<UserMarker>,
    },
    /// Remove a user from a channel (no-op when not a member)
    RemoveMember {
        #[clap(long)]
        channel: Id<ChannelMarker>,
        #[clap(long)]
        user: Id<UserMarker>,
    },
}

pub fn run(args: AdminCommand) -> Result<(), AdminError> {
    let config = config::Server::load().change_context(AdminError)?;
    super::init_tracing();

    super::build_runtime()
        .change_context(AdminError)?
        .block_on(async move {
            let app = App::new(config).await.change_context(AdminError)?;
            match args.action {
                AdminAction::User(action) => run_user_action(&app, action).await,
                AdminAction::Channel(action) => run_channel_action(&app, action).await,
            }
        })
}

fn not_found(what: &'static str) -> Report<AdminError> {
    Report::new(AdminError).attach_printable(format!("{what} not found"))
}

async fn run_user_action(app: &App, action: UserAction) -> Result<(), AdminError> {
    let mut conn = app.db_write().await.change_context(AdminError)?;

    match action {
        UserAction::Show {
            email,
            include_deleted,
        } => {
            let user = if include_deleted {
                User::find_by_email_any(&mut conn, &email).await
            } else {
                User::find_by_email(&mut conn, &email).await
            }
            .change_context(AdminError)?
            .ok_or_else(|| not_found("user"))?;

            print_user(&user);
        }
        UserAction::Restore { email } => {
            let user = User::restore(&mut conn, &email)
                .await
                .change_context(AdminError)?
                .ok_or_else(|| not_found("user"))?;

            println!("restored {}", user.email);
        }
        UserAction::SoftDelete { email } => {
            let user = User::soft_delete(&mut conn, &email)
                .await
                .change_context(AdminError)?
                .ok_or_else(|| not_found("user"))?;

            println!(
                "soft-deleted {} at {}",
                user.email,
                user.deleted_at.map(|t| t.to_string()).unwrap_or_default()
            );
        }
        UserAction::ResetPassword { email, password } => {
            if !is_valid_password(&password) {
                return Err(Report::new(AdminError)
                    .attach_printable("password must be between 12 and 128 characters"));
            }

            let user = User::reset_password(&mut conn, &email, &password)
                .await
                .change_context(AdminError)?
                .ok_or_else(|| not_found("user"))?;

            println!("password reset for {}", user.email);
        }
        UserAction::BackfillDefaults {
            department,
            timezone,
            language,
            display_names,
        } => {
            let rules = BackfillDefaults {
                department: department.as_deref(),
                timezone: timezone.as_deref(),
                language: language.as_deref(),
                display_name_from_email: display_names,
            };

            let count = User::backfill_defaults(&mut conn, &rules)
                .await
                .change_context(AdminError)?;

            println!("{count} row(s) backfilled");
        }
    }

    Ok(())
}

async fn run_channel_action(app: &App, action: ChannelAction) -> Result<(), AdminError> {
    let mut conn = app.db_write().await.change_context(AdminError)?;

    match action {
        ChannelAction::List { include_deleted } => {
            let channels = Channel::list_all(&mut conn, include_deleted)
                .await
                .change_context(AdminError)?;

            for channel in &channels {
                let state = if channel.deleted_at.is_some() {
                    " (deleted)"
                } else {
                    ""
                };
                println!(
                    "{} {:<24} {}{state}",
                    channel.id, channel.name, channel.channel_type
                );
            }
            println!("{} channel(s)", channels.len());
        }
        ChannelAction::AddMember { channel, user } => {
            let change = Channel::add_member(&mut conn, channel, user)
                .await
                .change_context(AdminError)?
                .ok_or_else(|| not_found("channel"))?;

            match change {
                MembershipChange::Added => println!("added {user} to {channel}"),
                MembershipChange::AlreadyMember => println!("{user} is already a member"),
                _ => {}
            }
        }
        ChannelAction::RemoveMember { channel, user } => {
            let change = Channel::remove_member(&mut conn, channel, user)
                .await
                .change_context(AdminError)?
                .ok_or_else(|| not_found("channel"))?;

            match change {
                MembershipChange::Removed => println!("removed {user} from {channel}"),
                MembershipChange::NotMember => println!("{user} is not a member"),
                _ => {}
            }
        }
    }

    Ok(())
}

fn print_user(user: &User) {
    println!("id:             {}", user.id);
    println!("email:          {}", user.email);
    println!("role:           {}", user.role);
    println!(
        "display name:   {}",
        user.display_name.as_deref().unwrap_or("-")
    );
    println!(
        "department:     {}",
        user.department.as_deref().unwrap_or("-")
    );
    println!("job title:      {}", user.job_title.as_deref().unwrap_or("-"));
    println!("phone:          {}", user.phone.as_deref().unwrap_or("-"));
    println!("timezone:       {}", user.timezone.as_deref().unwrap_or("-"));
    println!("language:       {}", user.language.as_deref().unwrap_or("-"));
    println!("email verified: {}", user.email_verified);
    println!(
        "password:       {}",
        if user.password_hash.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("failed logins:  {}", user.failed_login_attempts);
    println!(
        "locked until:   {}",
        user.locked_until.map(|t| t.to_string()).unwrap_or_default()
    );
    println!(
        "deleted at:     {}",
        user.deleted_at
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("login count:    {}", user.login_count);
    println!("version:        {}", user.version);
}

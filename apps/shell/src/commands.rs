use clap::{CommandFactory, Parser, Subcommand};
use strata::domain::{NewUser, UserId};
use strata::users::UserService;

#[derive(Debug, Parser)]
#[command(
    name = "strata",
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true,
    help_template = "Commands:\n{subcommands}"
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// List every user
    List,
    /// Show one user
    Get { id: UserId },
    /// Register a user
    Create {
        name: String,
        email: String,
        #[arg(long)]
        admin: bool,
    },
    /// Change the email of a user
    Email { id: UserId, address: String },
    /// Deactivate a user
    Deactivate { id: UserId },
    /// Show this list
    Help,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Parses one input line. The error is a single line without the `error: ` prefix.
pub(crate) fn parse(line: &str) -> Result<Command, String> {
    Line::try_parse_from(line.split_whitespace()).map(|line| line.command).map_err(|err| {
        let rendered = err.to_string();
        let first = rendered.lines().next().unwrap_or_default();
        first.strip_prefix("error: ").unwrap_or(first).to_owned()
    })
}

pub(crate) fn help() -> String {
    Line::command().render_help().to_string().trim_end().to_owned()
}

/// Runs a user command and serializes its result as one JSON line.
///
/// # Errors
/// The service error, or a serialization failure.
pub(crate) async fn execute(users: &UserService, command: Command) -> anyhow::Result<String> {
    let json = match command {
        Command::List => serde_json::to_string(&users.list_users().await?)?,
        Command::Get { id } => serde_json::to_string(&users.get_user(id).await?)?,
        Command::Create { name, email, admin } => {
            let mut new_user = NewUser::new(name, email);
            new_user.is_admin = admin;
            serde_json::to_string(&users.create_user(new_user).await?)?
        },
        Command::Email { id, address } => {
            serde_json::to_string(&users.change_email(id, address).await?)?
        },
        Command::Deactivate { id } => serde_json::to_string(&users.deactivate_user(id).await?)?,
        Command::Help | Command::Quit => anyhow::bail!("'{command:?}' is handled by the session"),
    };
    Ok(json)
}

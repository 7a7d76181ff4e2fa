use clap::{Args, Subcommand};
use redeem_app::database;

mod create;
mod list;
mod revoke;

/// Manage the API tokens storefronts and admin tools authenticate with.
#[derive(Debug, Args)]
pub(crate) struct TokenCommand {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Debug, Subcommand)]
enum TokenSubcommand {
    Create(create::CreateTokenArgs),
    List(list::ListTokensArgs),
    Revoke(revoke::RevokeTokenArgs),
}

pub(crate) async fn run(command: TokenCommand) -> Result<(), String> {
    let database_url = command
        .database_url
        .ok_or_else(|| "--database-url or DATABASE_URL is required".to_string())?;

    let pool = database::connect(&database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    match command.command {
        TokenSubcommand::Create(args) => create::run(pool, args).await,
        TokenSubcommand::List(args) => list::run(pool, args).await,
        TokenSubcommand::Revoke(args) => revoke::run(pool, args).await,
    }
}

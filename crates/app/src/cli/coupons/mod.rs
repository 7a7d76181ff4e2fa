use std::sync::Arc;

use clap::{Args, Subcommand};
use redeem_app::{
    database,
    domain::coupons::{repositories::PgCouponsRepository, service::CouponsManager},
};

mod list;
mod status;

#[derive(Debug, Args)]
pub(crate) struct CouponsCommand {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: CouponsSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponsSubcommand {
    List(list::ListCouponsArgs),
    Enable(status::StatusArgs),
    Disable(status::StatusArgs),
}

pub(crate) async fn run(command: CouponsCommand) -> Result<(), String> {
    let database_url = command
        .database_url
        .ok_or_else(|| "--database-url or DATABASE_URL is required".to_string())?;

    let pool = database::connect(&database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let coupons = CouponsManager::new(Arc::new(PgCouponsRepository::new(pool)));

    match command.command {
        CouponsSubcommand::List(args) => list::run(&coupons, args).await,
        CouponsSubcommand::Enable(args) => status::run(&coupons, args, true).await,
        CouponsSubcommand::Disable(args) => status::run(&coupons, args, false).await,
    }
}

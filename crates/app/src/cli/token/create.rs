use clap::Args;
use jiff::Timestamp;
use redeem_app::auth::{Capability, PgAuthService};
use sqlx::PgPool;

#[derive(Debug, Args)]
pub(crate) struct CreateTokenArgs {
    /// Human readable label, e.g. the storefront or admin tool using the token
    #[arg(long)]
    name: String,

    /// Capability granted to the token (`manage_coupons`, `quote_carts`); repeatable
    #[arg(long = "capability", required = true)]
    capabilities: Vec<Capability>,

    /// Optional token expiration timestamp (RFC 3339)
    #[arg(long)]
    token_expires_at: Option<String>,
}

pub(crate) async fn run(pool: PgPool, args: CreateTokenArgs) -> Result<(), String> {
    if args.name.trim().is_empty() {
        return Err("name cannot be empty".to_string());
    }

    let token_expires_at = parse_token_expires_at(args.token_expires_at.as_deref())?;

    if let Some(expires_at) = token_expires_at.as_ref()
        && *expires_at <= Timestamp::now()
    {
        return Err("token-expires-at must be in the future".to_string());
    }

    let service = PgAuthService::new(pool);

    let issued = service
        .issue_api_token(args.name, args.capabilities, token_expires_at)
        .await
        .map_err(|error| format!("failed to create token: {error}"))?;

    println!("token_uuid: {}", issued.metadata.uuid);
    println!("token_name: {}", issued.metadata.name);
    println!("token_version: {}", issued.metadata.version.as_i16());
    println!("capabilities: {}", format_capabilities(&issued.metadata.capabilities));
    println!("token_created_at: {}", issued.metadata.created_at);
    if let Some(expires_at) = issued.metadata.expires_at {
        println!("token_expires_at: {expires_at}");
    }
    println!("api_token: {}", issued.token);
    println!("store this token now; it is only shown once");

    Ok(())
}

pub(crate) fn format_capabilities(capabilities: &[Capability]) -> String {
    capabilities
        .iter()
        .map(|capability| capability.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_token_expires_at(raw: Option<&str>) -> Result<Option<Timestamp>, String> {
    raw.map(|value| {
        value
            .parse::<Timestamp>()
            .map_err(|error| format!("invalid token-expires-at timestamp: {error}"))
    })
    .transpose()
}

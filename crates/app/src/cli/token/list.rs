use clap::Args;
use jiff::Timestamp;
use redeem_app::auth::{ApiTokenMetadata, PgAuthRepository};
use sqlx::PgPool;

use super::create::format_capabilities;

#[derive(Debug, Args)]
pub(crate) struct ListTokensArgs {
    /// Only show tokens that can still authenticate
    #[arg(long)]
    active: bool,
}

pub(crate) async fn run(pool: PgPool, args: ListTokensArgs) -> Result<(), String> {
    let tokens = PgAuthRepository::new(pool)
        .list_api_tokens()
        .await
        .map_err(|error| format!("failed to list tokens: {error}"))?;

    let now = Timestamp::now();

    let tokens: Vec<_> = tokens
        .into_iter()
        .filter(|token| !args.active || is_active(token, now))
        .collect();

    if tokens.is_empty() {
        println!("no tokens found");
        return Ok(());
    }

    for token in &tokens {
        println!("{}", format_token(token, now));
    }

    Ok(())
}

fn is_active(token: &ApiTokenMetadata, now: Timestamp) -> bool {
    token.revoked_at.is_none() && token.expires_at.is_none_or(|expires_at| expires_at > now)
}

/// One tab-separated line: uuid, name, capabilities, state, last use.
fn format_token(token: &ApiTokenMetadata, now: Timestamp) -> String {
    let state = match (token.revoked_at, token.expires_at) {
        (Some(revoked_at), _) => format!("revoked {revoked_at}"),
        (None, Some(expires_at)) if expires_at <= now => format!("expired {expires_at}"),
        (None, Some(expires_at)) => format!("active until {expires_at}"),
        (None, None) => "active".to_string(),
    };

    let last_used = token
        .last_used_at
        .map_or_else(|| "never used".to_string(), |value| format!("last used {value}"));

    format!(
        "{}\t{}\t{}\t{state}\t{last_used}",
        token.uuid,
        token.name,
        format_capabilities(&token.capabilities),
    )
}

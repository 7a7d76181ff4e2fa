use clap::Args;
use redeem_app::auth::PgAuthRepository;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct RevokeTokenArgs {
    /// Token UUID to revoke
    #[arg(long)]
    token_uuid: Uuid,
}

/// Revoked tokens stop authenticating on the next request.
pub(crate) async fn run(pool: PgPool, args: RevokeTokenArgs) -> Result<(), String> {
    let revoked = PgAuthRepository::new(pool)
        .revoke_api_token(args.token_uuid)
        .await
        .map_err(|error| format!("failed to revoke token: {error}"))?;

    match revoked {
        Some(_) => println!("revoked token {}", args.token_uuid),
        None => println!("token {} was not active", args.token_uuid),
    }

    Ok(())
}

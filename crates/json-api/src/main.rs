//! Redeem JSON API Server

use std::process;

use redeem_app::{auth::Capability, context::AppContext};
use salvo::{
    affix_state::inject,
    oapi::{
        OpenApi,
        security::{Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    trailing_slash::remove_slash,
};
use tracing::{error, info};

use crate::{auth::RequireCapability, config::ServerConfig, state::State};

mod auth;
mod config;
mod coupons;
mod extensions;
mod healthcheck;
mod observability;
mod shutdown;
mod state;
mod storefront;
#[cfg(test)]
mod test_helpers;

fn admin_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .hoop(RequireCapability(Capability::ManageCoupons))
        .push(
            Router::with_path("coupons")
                .get(coupons::index::handler)
                .post(coupons::create::handler)
                .push(
                    Router::with_path("{coupon}")
                        .get(coupons::get::handler)
                        .delete(coupons::delete::handler)
                        .push(Router::with_path("status").put(coupons::status::handler))
                        .push(Router::with_path("validity").put(coupons::validity::handler)),
                ),
        )
}

fn storefront_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .hoop(RequireCapability(Capability::QuoteCarts))
        .push(Router::with_path("storefront/quote").post(storefront::quote::handler))
}

/// Redeem JSON API Server entry point
#[tokio::main]
pub async fn main() {
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = observability::init(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Observability error: {init_error}");
        }

        process::exit(1);
    }

    let addr = config.socket_addr();
    let grace = config.server.shutdown_grace();

    info!("Starting server on {addr}");

    let listener = TcpListener::new(addr).bind().await;

    let app = match AppContext::from_database_url(
        &config.database.database_url,
        config.database.database_max_connections,
    )
    .await
    {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            process::exit(1);
        }
    };

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(observability::request_logging)
        .hoop(inject(State::from_app_context(app)))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(admin_router())
        .push(storefront_router());

    let doc = OpenApi::new("Redeem API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, grace).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(router).await;
}

#[cfg(test)]
mod tests {
    use redeem_app::auth::{Actor, MockAuthService};
    use salvo::{http::header::AUTHORIZATION, test::TestClient};
    use uuid::Uuid;

    use crate::test_helpers::state_with_auth;

    use super::*;

    fn make_service(capabilities: Vec<Capability>) -> Service {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .withf(|token| token == "rd_test")
            .returning(move |_| {
                Ok(Actor {
                    token_uuid: Uuid::nil(),
                    name: "storefront".to_string(),
                    capabilities: capabilities.clone(),
                })
            });

        Service::new(
            Router::new()
                .hoop(inject(state_with_auth(auth)))
                .push(admin_router())
                .push(storefront_router()),
        )
    }

    #[tokio::test]
    async fn admin_routes_need_a_token() {
        let res = TestClient::get("http://example.com/coupons")
            .send(&make_service(vec![Capability::ManageCoupons]))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn storefront_tokens_cannot_manage_coupons() {
        let res = TestClient::delete("http://example.com/coupons/1")
            .add_header(AUTHORIZATION, "Bearer rd_test", true)
            .send(&make_service(vec![Capability::QuoteCarts]))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn admin_tokens_cannot_quote_carts() {
        let res = TestClient::post("http://example.com/storefront/quote")
            .add_header(AUTHORIZATION, "Bearer rd_test", true)
            .json(&serde_json::json!({ "lines": [] }))
            .send(&make_service(vec![Capability::ManageCoupons]))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
    }
}

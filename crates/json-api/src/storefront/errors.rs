//! Storefront Errors

use salvo::http::StatusError;
use tracing::error;

use redeem_app::domain::storefront::StorefrontServiceError;

pub(crate) fn into_status_error(error: StorefrontServiceError) -> StatusError {
    match &error {
        StorefrontServiceError::Coupons(source) => {
            error!("failed to load coupons for quote: {source}");
        }
        StorefrontServiceError::Spend(source) => {
            error!("failed to load customer spend for quote: {source}");
        }
    }

    StatusError::internal_server_error()
}

//! Coupon Errors

use salvo::http::StatusError;
use tracing::error;

use redeem_app::domain::coupons::CouponsServiceError;

pub(crate) fn into_status_error(error: CouponsServiceError) -> StatusError {
    match error {
        CouponsServiceError::DuplicateCode => {
            StatusError::conflict().brief("Coupon code already exists")
        }
        CouponsServiceError::NotFound => StatusError::not_found().brief("Coupon not found"),
        CouponsServiceError::Validation(source) => {
            StatusError::bad_request().brief(format!("Invalid coupon: {source}"))
        }
        CouponsServiceError::Persistence(source) => {
            error!("coupon store failure: {source}");

            StatusError::internal_server_error()
        }
    }
}

//! Point-in-time query parsing.
//!
//! Quotes can be priced as of any instant, so validity windows can be checked
//! ahead of a launch.

use jiff::Timestamp;
use salvo::{oapi::extract::QueryParam, prelude::StatusError};

use crate::extensions::*;

pub(crate) trait PointInTimeExt {
    /// The `at` instant, defaulting to now.
    fn into_point_in_time(self) -> Result<Timestamp, StatusError>;
}

impl PointInTimeExt for QueryParam<String, false> {
    fn into_point_in_time(self) -> Result<Timestamp, StatusError> {
        self.into_inner()
            .map(|value| value.parse::<Timestamp>())
            .transpose()
            .or_400("could not parse \"at\" query parameter")
            .map(|point_in_time| point_in_time.unwrap_or_else(Timestamp::now))
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use super::*;

    #[endpoint]
    async fn echo(at: QueryParam<String, false>) -> Result<String, StatusError> {
        Ok(at.into_point_in_time()?.to_string())
    }

    fn service() -> Service {
        Service::new(Router::new().get(echo))
    }

    #[tokio::test]
    async fn explicit_instants_are_used() -> TestResult {
        let body = TestClient::get("http://example.com/?at=2026-05-01T08:30:00Z")
            .send(&service())
            .await
            .take_string()
            .await?;

        assert_eq!(body, "2026-05-01T08:30:00Z");

        Ok(())
    }

    #[tokio::test]
    async fn missing_instant_defaults_to_now() -> TestResult {
        let before = Timestamp::now();

        let body = TestClient::get("http://example.com/")
            .send(&service())
            .await
            .take_string()
            .await?;

        assert!(body.parse::<Timestamp>()? >= before);

        Ok(())
    }

    #[tokio::test]
    async fn malformed_instants_are_bad_requests() {
        let res = TestClient::get("http://example.com/?at=soon")
            .send(&service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}

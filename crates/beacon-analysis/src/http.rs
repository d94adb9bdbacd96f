//! Status-code checks shared by every call to the analysis service.

use crate::error::AnalysisError;

/// Return the response unchanged on success.
///
/// 429 becomes [`AnalysisError::RateLimited`] (falling back to 60 s when
/// `Retry-After` is absent or not numeric); any other non-success status
/// becomes [`AnalysisError::Api`] carrying the response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, AnalysisError> {
    if resp.status() == 429 {
        return Err(AnalysisError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        return Err(AnalysisError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, retry_after: Option<&str>, body: &'static str) -> reqwest::Response {
        let mut builder = ::http::Response::builder().status(status);
        if let Some(value) = retry_after {
            builder = builder.header("Retry-After", value);
        }
        reqwest::Response::from(builder.body(body).unwrap())
    }

    #[tokio::test]
    async fn rate_limit_uses_header() {
        let err = check_response(response(429, Some("30"), "")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn rate_limit_defaults_when_header_is_garbage() {
        let err = check_response(response(429, Some("soon"), "")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::RateLimited { retry_after_secs: 60 }));
    }

    #[tokio::test]
    async fn server_error_keeps_body() {
        let err = check_response(response(503, None, "model overloaded"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AnalysisError::Api { status: 503, ref message } if message == "model overloaded")
        );
    }

    #[tokio::test]
    async fn success_passes_through() {
        assert!(check_response(response(200, None, "{}")).await.is_ok());
    }
}

use prompt_harness_core::ProviderErrorKind;
use reqwest::StatusCode;

/// Maps a non-success HTTP status to a provider error kind.
pub fn classify_status(status: StatusCode) -> ProviderErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorKind::AuthError,
        StatusCode::REQUEST_TIMEOUT => ProviderErrorKind::Timeout,
        StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::RateLimitError,
        _ => ProviderErrorKind::ProviderServerError,
    }
}

/// Maps a transport-level failure to a provider error kind.
pub fn classify_transport(err: &reqwest::Error) -> ProviderErrorKind {
    if err.is_timeout() {
        ProviderErrorKind::Timeout
    } else if err.is_decode() || err.is_body() {
        ProviderErrorKind::ProviderServerError
    } else {
        ProviderErrorKind::NetworkError
    }
}

/// Short detail string for a failed status, keeping the body bounded.
pub(crate) fn status_detail(status: StatusCode, body: &str) -> String {
    const MAX_BODY: usize = 300;
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let snippet: String = body.chars().take(MAX_BODY).collect();
    if snippet.len() < body.len() {
        format!("HTTP {status}: {snippet}...")
    } else {
        format!("HTTP {status}: {snippet}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            ProviderErrorKind::AuthError
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            ProviderErrorKind::AuthError
        );
        assert_eq!(
            classify_status(StatusCode::REQUEST_TIMEOUT),
            ProviderErrorKind::Timeout
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            ProviderErrorKind::RateLimitError
        );
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            ProviderErrorKind::ProviderServerError
        );
        assert_eq!(
            classify_status(StatusCode::IM_A_TEAPOT),
            ProviderErrorKind::ProviderServerError
        );
    }

    #[test]
    fn test_status_detail_truncates_body() {
        assert_eq!(
            status_detail(StatusCode::BAD_GATEWAY, "  "),
            "HTTP 502 Bad Gateway"
        );
        let long = "x".repeat(1000);
        let detail = status_detail(StatusCode::BAD_REQUEST, &long);
        assert!(detail.ends_with("..."));
        assert!(detail.len() < 400);
    }
}

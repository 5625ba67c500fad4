// LogPoller - util/endpoint.rs
//
// Endpoint validation shared by config loading, the Options dialog and the
// HTTP source, so every entry point accepts exactly the same URLs.

use crate::util::error::FetchError;
use reqwest::Url;

/// Validate an endpoint string: it must parse as a URL with an http(s)
/// scheme and a host.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_accepts_http_and_https() {
        assert!(parse_endpoint("http://127.0.0.1/log_stream").is_ok());
        assert!(parse_endpoint("https://logs.example.com:8443/log_stream").is_ok());
    }

    #[test]
    fn test_parse_endpoint_rejects_other_schemes() {
        let err = parse_endpoint("ftp://example.com/log").unwrap_err();
        assert!(
            matches!(err, FetchError::InvalidEndpoint { ref reason, .. } if reason.contains("ftp")),
            "got {err:?}"
        );
    }

    #[test]
    fn test_parse_endpoint_rejects_garbage() {
        assert!(matches!(
            parse_endpoint("not a url"),
            Err(FetchError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_parse_endpoint_rejects_missing_host() {
        let err = parse_endpoint("http://").unwrap_err();
        assert!(matches!(err, FetchError::InvalidEndpoint { .. }), "got {err:?}");
    }
}

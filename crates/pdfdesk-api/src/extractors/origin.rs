//! Request origin extractor used to build absolute download URLs.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::http::request::Parts;

/// Scheme and host the client used to reach the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    /// `http` or `https`.
    pub scheme: String,
    /// Host header value, including any port.
    pub host: String,
}

impl RequestOrigin {
    /// Read `X-Forwarded-Proto` and `Host`; scheme defaults to `http`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http".to_string());
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("localhost")
            .to_string();
        Self { scheme, host }
    }

    /// `scheme://host`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut origin = Self::from_headers(&parts.headers);
        // HTTP/2 clients send the authority instead of a Host header.
        if parts.headers.get(HOST).is_none() {
            if let Some(authority) = parts.uri.authority() {
                origin.host = authority.to_string();
            }
        }
        Ok(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_proto_and_host() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("pdf.example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("HTTPS, http"));

        let origin = RequestOrigin::from_headers(&headers);
        assert_eq!(origin.base_url(), "https://pdf.example.com");
    }

    #[test]
    fn test_defaults() {
        let origin = RequestOrigin::from_headers(&HeaderMap::new());
        assert_eq!(origin.base_url(), "http://localhost");
    }
}

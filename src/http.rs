use reqwest::{StatusCode, header};

use crate::config::HttpConfig;
use crate::prelude::*;

/// Why a request to the upstream API or an image host did not produce a usable body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("'{url}' was not found (HTTP 404)")]
    NotFound { url: String },

    #[error("the request for '{url}' was rejected with status {status}")]
    Rejected { url: String, status: StatusCode },

    #[error("the request for '{url}' was rate limited (HTTP 429)")]
    RateLimited { url: String },

    #[error("the server failed to handle '{url}' (status {status})")]
    Server { url: String, status: StatusCode },

    #[error("a network error occurred while requesting '{url}': {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("the response from '{url}' could not be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Whether retrying the same request later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited { .. } | FetchError::Server { .. } | FetchError::Network { .. }
        )
    }

    fn from_status(url: &str, status: StatusCode) -> Option<Self> {
        let url = url.to_string();
        match status {
            s if s.is_success() => None,
            StatusCode::NOT_FOUND => Some(FetchError::NotFound { url }),
            StatusCode::TOO_MANY_REQUESTS => Some(FetchError::RateLimited { url }),
            s if s.is_server_error() => Some(FetchError::Server { url, status: s }),
            s => Some(FetchError::Rejected { url, status: s }),
        }
    }
}

/// Builds the shared client; every request made during a run carries the configured identity.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client, human_errors::Error> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_str(&config.accept).wrap_err_as_user(
            "The configured HTTP Accept header is not a valid header value.",
            &["Check the 'http.accept' entry in your configuration file."],
        )?,
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_str(&config.accept_language).wrap_err_as_user(
            "The configured HTTP Accept-Language header is not a valid header value.",
            &["Check the 'http.accept_language' entry in your configuration file."],
        )?,
    );
    headers.insert(header::CONNECTION, header::HeaderValue::from_static("keep-alive"));

    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .wrap_err_as_system(
            "We could not set up the HTTP client.",
            &["Please report this issue to the development team on GitHub."],
        )
}

pub async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

    if let Some(err) = FetchError::from_status(url, response.status()) {
        return Err(err);
    }

    let body = response.bytes().await.map_err(|source| FetchError::Network {
        url: url.to_string(),
        source,
    })?;

    Ok(body.to_vec())
}

pub async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T, FetchError> {
    let body = get_bytes(client, url).await?;
    serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[rstest]
    #[case(200, None)]
    #[case(404, Some(false))]
    #[case(400, Some(false))]
    #[case(403, Some(false))]
    #[case(429, Some(true))]
    #[case(502, Some(true))]
    fn test_status_classification(#[case] status: u16, #[case] transient: Option<bool>) {
        let status = StatusCode::from_u16(status).unwrap();
        let err = FetchError::from_status("https://example.com", status);
        assert_eq!(err.map(|e| e.is_transient()), transient);
    }

    #[tokio::test]
    async fn test_requests_carry_configured_identity() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("user-agent", "archive-test/1.0"))
            .and(header("accept-language", "en-GB"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok": true}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = build_client(&HttpConfig {
            user_agent: "archive-test/1.0".into(),
            accept_language: "en-GB".into(),
            ..Default::default()
        })
        .unwrap();

        let body: serde_json::Value = get_json(&client, &format!("{}/ping", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_not_found_is_typed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = build_client(&HttpConfig::default()).unwrap();
        let err = get_bytes(&client, &mock_server.uri()).await.unwrap_err();

        assert!(matches!(err, FetchError::NotFound { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&mock_server)
            .await;

        let client = build_client(&HttpConfig::default()).unwrap();
        let err = get_json::<serde_json::Value>(&client, &mock_server.uri())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
    }
}

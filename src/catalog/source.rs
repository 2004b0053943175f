use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::catalog::entry::{CatalogBody, Platform};
use crate::util::env::{env_opt, env_parse};

pub const DEFAULT_ANDROID_URL: &str =
    "https://interview-marketing-eng-dev.s3.eu-west-1.amazonaws.com/android.top100.json";
pub const DEFAULT_IOS_URL: &str =
    "https://interview-marketing-eng-dev.s3.eu-west-1.amazonaws.com/ios.top100.json";

/// Why a catalog could not be fetched. Any of these aborts the import.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}")]
    Status { url: Url, status: StatusCode },
    #[error("{url} returned a malformed catalog: {source}")]
    Malformed {
        url: Url,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the two top-lists live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSources {
    pub android: Url,
    pub ios: Url,
}

impl CatalogSources {
    pub fn new(android: &str, ios: &str) -> Result<Self> {
        Ok(Self {
            android: Url::parse(android)
                .with_context(|| format!("invalid android catalog url {android:?}"))?,
            ios: Url::parse(ios).with_context(|| format!("invalid ios catalog url {ios:?}"))?,
        })
    }

    /// `ANDROID_CATALOG_URL` / `IOS_CATALOG_URL`, defaulting to the public top-100 lists.
    pub fn from_env() -> Result<Self> {
        let android = env_opt("ANDROID_CATALOG_URL").unwrap_or_else(|| DEFAULT_ANDROID_URL.into());
        let ios = env_opt("IOS_CATALOG_URL").unwrap_or_else(|| DEFAULT_IOS_URL.into());
        Self::new(&android, &ios)
    }

    pub fn url(&self, platform: Platform) -> &Url {
        match platform {
            Platform::Android => &self.android,
            Platform::Ios => &self.ios,
        }
    }
}

/// HTTP client for remote catalogs.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
}

impl CatalogClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("game-catalog/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build catalog http client")?;
        Ok(Self { http })
    }

    /// Timeout from `CATALOG_HTTP_TIMEOUT_SECS` (default 30s).
    pub fn from_env() -> Result<Self> {
        Self::new(env_parse("CATALOG_HTTP_TIMEOUT_SECS", 30u64))
    }

    /// GET one catalog and decode its shape. Non-2xx statuses are errors.
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<CatalogBody, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.clone(),
            source,
        };

        let resp = self.http.get(url.clone()).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }

        let bytes = resp.bytes().await.map_err(transport)?;
        let body = CatalogBody::from_slice(&bytes).map_err(|source| FetchError::Malformed {
            url: url.clone(),
            source,
        })?;
        debug!(
            bytes = bytes.len(),
            nested = matches!(body, CatalogBody::Nested(_)),
            "catalog fetched"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::serve_catalogs;

    #[test]
    fn sources_reject_invalid_urls() {
        assert!(CatalogSources::new("not a url", DEFAULT_IOS_URL).is_err());
        let sources = CatalogSources::new(DEFAULT_ANDROID_URL, DEFAULT_IOS_URL).unwrap();
        assert!(sources.url(Platform::Android).as_str().ends_with("android.top100.json"));
        assert!(sources.url(Platform::Ios).as_str().ends_with("ios.top100.json"));
    }

    #[actix_web::test]
    async fn fetch_decodes_flat_and_nested_bodies() {
        let base = serve_catalogs(
            (200, r#"[{"name":"Foo"}]"#),
            (200, r#"[[{"name":"Bar"}],[{"name":"Baz"}]]"#),
        );
        let client = CatalogClient::new(5).unwrap();

        let flat = client
            .fetch(&Url::parse(&format!("{base}/android.json")).unwrap())
            .await
            .unwrap();
        assert!(matches!(flat, CatalogBody::Flat(ref e) if e.len() == 1));

        let nested = client
            .fetch(&Url::parse(&format!("{base}/ios.json")).unwrap())
            .await
            .unwrap();
        assert_eq!(nested.into_entries().len(), 2);
    }

    #[actix_web::test]
    async fn fetch_reports_status_and_malformed_bodies() {
        let base = serve_catalogs((500, r#"{"error":"boom"}"#), (200, r#"{"not":"a list"}"#));
        let client = CatalogClient::new(5).unwrap();

        let err = client
            .fetch(&Url::parse(&format!("{base}/android.json")).unwrap())
            .await
            .unwrap_err();
        assert!(
            matches!(err, FetchError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR)
        );

        let err = client
            .fetch(&Url::parse(&format!("{base}/ios.json")).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[actix_web::test]
    async fn fetch_reports_transport_failures() {
        let client = CatalogClient::new(2).unwrap();
        // Port 9 (discard) is essentially never listening on loopback.
        let err = client
            .fetch(&Url::parse("http://127.0.0.1:9/android.json").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}

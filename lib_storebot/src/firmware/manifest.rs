//! Downloads the firmware manifest document.

use serde_json::Value;
use tracing::warn;

use crate::errors::StoreBotError;
use crate::retrieve::{FetchOptions, UpstreamFetcher};

/// Where and how to fetch the manifest.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    fetcher: UpstreamFetcher,
    url: String,
    opts: FetchOptions,
}

impl ManifestSource {
    /// `fetcher` should be built with certificate validation relaxed; the
    /// manifest host presents a chain outside the default roots.
    pub fn new(fetcher: UpstreamFetcher, url: impl Into<String>, opts: FetchOptions) -> Self {
        Self {
            fetcher,
            url: url.into(),
            opts,
        }
    }

    /// Fetches the document. A body that is not a JSON object is
    /// `ManifestMalformed`; transport failures keep their own variants.
    pub async fn fetch(&self) -> Result<Value, StoreBotError> {
        let document: Value = match self.fetcher.fetch_json(&self.url, self.opts).await {
            Ok(doc) => doc,
            Err(StoreBotError::UpstreamDecode { message, .. }) => {
                warn!(url = %self.url, %message, "manifest body is not JSON");
                return Err(StoreBotError::ManifestMalformed(message));
            }
            Err(e) => return Err(e),
        };

        if !document.is_object() {
            warn!(url = %self.url, "manifest body is not an object");
            return Err(StoreBotError::ManifestMalformed("top-level value is not an object".to_string()));
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::FetcherConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(body: &str) -> (MockServer, ManifestSource) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/pmv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        let fetcher = UpstreamFetcher::new(FetcherConfig::default()).expect("client builds");
        let source = ManifestSource::new(fetcher, format!("{}/v2/pmv", server.uri()), FetchOptions::new(1000, 0));
        (server, source)
    }

    #[tokio::test]
    async fn object_documents_pass_through() {
        let (_server, source) = source_for(r#"{"PublicAssetSets":{}}"#).await;
        assert!(source.fetch().await.unwrap().get("PublicAssetSets").is_some());
    }

    #[tokio::test]
    async fn non_objects_are_malformed() {
        let (_server, source) = source_for("[1,2,3]").await;
        assert!(matches!(source.fetch().await, Err(StoreBotError::ManifestMalformed(_))));

        let (_server, source) = source_for("not json").await;
        assert!(matches!(source.fetch().await, Err(StoreBotError::ManifestMalformed(_))));
    }
}

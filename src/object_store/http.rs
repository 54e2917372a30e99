use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio_util::io::ReaderStream;

use super::{validate_key, ObjectStore, ObjectStoreError};

/// Replica target speaking plain HTTP object semantics:
/// `PUT` and `HEAD` on `<base_url>/<key>`.
pub struct HttpStore {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, ObjectStoreError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: token.map(|s| s.to_string()),
        })
    }

    fn object_url(&self, key: &str) -> Result<String, ObjectStoreError> {
        validate_key(key)?;
        Ok(format!("{}/{}", self.base_url, key))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_upload(
        &self,
        key: &str,
        body: reqwest::Body,
    ) -> Result<(), ObjectStoreError> {
        let resp = self
            .authorize(self.client.put(self.object_url(key)?))
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ObjectStoreError::Backend(format!(
                "upload of {key} failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn put_file(&self, key: &str, path: &Path) -> Result<(), ObjectStoreError> {
        let file = tokio::fs::File::open(path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        self.send_upload(key, body).await
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let resp = self
            .authorize(self.client.head(self.object_url(key)?))
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(ObjectStoreError::Backend(format!(
                "existence check of {key} failed ({s})"
            ))),
        }
    }

    fn uri(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

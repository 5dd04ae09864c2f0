use log::error;
use serde::Deserialize;

use crate::errors::ApiError;

#[derive(Debug, Default, Deserialize)]
struct HrefResponse {
    #[serde(default)]
    href: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceMeta {
    #[serde(default)]
    public_url: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct UploadResult {
    pub file_name: String,
    pub public_url: Option<String>,
    pub direct_url: Option<String>,
}

/// Yandex Disk collaborator: store a blob, publish it, hand back the
/// public retrieval URLs. Five provider calls per upload, no retries.
pub struct DiskClient {
    http: reqwest::Client,
    base_url: String,
    oauth_token: String,
}

impl DiskClient {
    pub fn new(oauth_token: &str) -> Self {
        Self::with_base_url(oauth_token, "https://cloud-api.yandex.net")
    }

    pub fn with_base_url(oauth_token: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            oauth_token: oauth_token.to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("OAuth {}", self.oauth_token)
    }

    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResult, ApiError> {
        let provider_err = |what: &'static str| {
            move |e: reqwest::Error| {
                error!("yandex disk {} failed: {:?}", what, e);
                ApiError::ServerError
            }
        };

        // 1. ask for an upload href
        let link: HrefResponse = self
            .http
            .get(format!("{}/v1/disk/resources/upload", self.base_url))
            .query(&[("path", file_name), ("overwrite", "true")])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(provider_err("upload-link request"))?
            .json()
            .await
            .map_err(provider_err("upload-link decode"))?;
        let href = link.href.ok_or_else(|| {
            error!("yandex disk returned no upload href for {}", file_name);
            ApiError::ServerError
        })?;

        // 2. push the bytes
        let put = self
            .http
            .put(href)
            .body(bytes)
            .send()
            .await
            .map_err(provider_err("upload"))?;
        if !put.status().is_success() {
            error!("yandex disk upload rejected: {}", put.status());
            return Err(ApiError::ServerError);
        }

        // 3. publish
        let publish = self
            .http
            .put(format!("{}/v1/disk/resources/publish", self.base_url))
            .query(&[("path", file_name)])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(provider_err("publish"))?;
        if !publish.status().is_success() {
            error!("yandex disk publish rejected: {}", publish.status());
            return Err(ApiError::ServerError);
        }

        // 4. read back the public url
        let meta: ResourceMeta = self
            .http
            .get(format!("{}/v1/disk/resources", self.base_url))
            .query(&[("path", file_name)])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(provider_err("metadata request"))?
            .json()
            .await
            .map_err(provider_err("metadata decode"))?;

        // 5. resolve a direct download link when the file went public
        let mut direct_url = None;
        if let Some(public_url) = &meta.public_url {
            let download: HrefResponse = self
                .http
                .get(format!("{}/v1/disk/public/resources/download", self.base_url))
                .query(&[("public_key", public_url.as_str())])
                .send()
                .await
                .map_err(provider_err("download-link request"))?
                .json()
                .await
                .map_err(provider_err("download-link decode"))?;
            direct_url = download.href;
        }

        Ok(UploadResult {
            file_name: file_name.to_string(),
            public_url: meta.public_url,
            direct_url,
        })
    }
}

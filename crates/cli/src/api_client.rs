use anyhow::{Context, Result};
use ota_core::multipart::{Part, boundary_from_content_type, parse_multipart};
use ota_core::{Directive, Manifest, Platform, ProtocolVersion, UploadPath};
use reqwest::Url;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid server URL")?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("failed to build API URL")
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("API error ({}): {}", status, body);
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.url("/health")?;
        self.send_json(self.http.get(url)).await
    }

    /// Allocate the upload path of the next publish for a runtime version.
    pub async fn get_upload_path(&self, runtime_version: &str) -> Result<UploadPath> {
        let url = self.url("/get-upload-path")?;
        let response: UploadPathResponse = self
            .send_json(
                self.http
                    .get(url)
                    .query(&[("runtime-version", runtime_version)]),
            )
            .await?;
        UploadPath::parse(&response.path)
            .with_context(|| format!("server returned an invalid path: {}", response.path))
    }

    /// Record an uploaded publish as the newest update of both platforms.
    pub async fn sync(&self, upload_path: &UploadPath) -> Result<SyncResponse> {
        let url = self.url("/sync-with-db")?;
        self.send_json(self.http.get(url).query(&[
            ("runtime-version", upload_path.runtime_version.as_str()),
            ("ota-update-version", upload_path.ota_update_version.as_str()),
        ]))
        .await
    }

    /// Request the manifest endpoint the way a device does.
    pub async fn check_manifest(&self, request: &ManifestRequest) -> Result<ManifestCheck> {
        let url = self.url("/api/manifest")?;
        let mut req = self
            .http
            .get(url)
            .header("expo-protocol-version", request.protocol.to_string())
            .header("expo-platform", request.platform.as_str())
            .header("expo-runtime-version", &request.runtime_version);
        if let Some(id) = &request.current_update_id {
            req = req.header("expo-current-update-id", id);
        }

        let response = req.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        if !status.is_success() {
            anyhow::bail!("API error ({}): {}", status, String::from_utf8_lossy(&body));
        }

        let content_type = content_type.context("response has no content type")?;
        let boundary = boundary_from_content_type(&content_type)
            .with_context(|| format!("not a multipart response: {content_type}"))?;
        let parts = parse_multipart(&body, boundary)?;
        ManifestCheck::from_parts(&parts)
    }
}

/// Parameters of a manifest request.
#[derive(Clone, Debug)]
pub struct ManifestRequest {
    pub protocol: ProtocolVersion,
    pub platform: Platform,
    pub runtime_version: String,
    pub current_update_id: Option<String>,
}

/// Decoded manifest endpoint response.
#[derive(Debug)]
pub enum ManifestCheck {
    Update {
        manifest: Box<Manifest>,
        extensions: Value,
    },
    Directive(Directive),
}

impl ManifestCheck {
    fn from_parts(parts: &[Part]) -> Result<Self> {
        let find = |name: &str| parts.iter().find(|p| p.name == name);

        if let Some(part) = find("directive") {
            let directive = serde_json::from_slice(&part.body).context("invalid directive part")?;
            return Ok(Self::Directive(directive));
        }

        let manifest = find("manifest").context("response has no manifest part")?;
        let manifest = Manifest::from_json(&manifest.body)?;
        let extensions = match find("extensions") {
            Some(part) => serde_json::from_slice(&part.body).context("invalid extensions part")?,
            None => Value::Null,
        };
        Ok(Self::Update {
            manifest: Box::new(manifest),
            extensions,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadPathResponse {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncResponse {
    pub updates: Vec<SyncedUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedUpdate {
    pub id: String,
    pub platform: Platform,
    pub sort_key: i64,
}

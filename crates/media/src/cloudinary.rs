//! Cloudinary-backed [`MediaHost`].
//!
//! Uses the signed upload API: every request carries `api_key`, a unix
//! `timestamp` and a SHA-256 signature over the remaining parameters.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio_util::io::ReaderStream;

use crate::error::MediaError;
use crate::host::{MediaHost, ResourceKind, UploadedAsset};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

/// Credentials and endpoint for a Cloudinary account.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// API origin, overridable for tests.
    pub base_url: String,
}

impl CloudinaryConfig {
    /// Load from environment variables.
    ///
    /// | Env var                  | Required | Default                       |
    /// |--------------------------|----------|-------------------------------|
    /// | `CLOUDINARY_CLOUD_NAME`  | yes      | --                            |
    /// | `CLOUDINARY_API_KEY`     | yes      | --                            |
    /// | `CLOUDINARY_API_SECRET`  | yes      | --                            |
    /// | `CLOUDINARY_BASE_URL`    | no       | `https://api.cloudinary.com`  |
    pub fn from_env() -> Result<Self, MediaError> {
        let required = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| MediaError::Config(format!("{name} must be set")))
        };

        Ok(Self {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            base_url: std::env::var("CLOUDINARY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// HTTP client for one Cloudinary account.
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, kind: ResourceKind, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.config.base_url,
            self.config.cloud_name,
            kind.as_str(),
            action
        )
    }

    /// Ensure the response has a success status code, or return the status
    /// and body as [`MediaError::Api`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MediaError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MediaError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Sign `params` the way Cloudinary expects: sort by key, join as
/// `k=v&k=v`, append the secret and hex-encode the SHA-256 digest.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(
        &self,
        path: &Path,
        file_name: &str,
        kind: ResourceKind,
    ) -> Result<UploadedAsset, MediaError> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(&[("timestamp", &timestamp)], &self.config.api_secret);

        let part = reqwest::multipart::Part::stream_with_length(body, len)
            .file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint(kind, "upload"))
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = Self::ensure_success(response).await?.json().await?;

        tracing::debug!(
            public_id = %uploaded.public_id,
            bytes = len,
            kind = kind.as_str(),
            "Uploaded asset to Cloudinary",
        );

        Ok(UploadedAsset {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            duration: uploaded.duration,
        })
    }

    async fn delete(&self, public_id: &str, kind: ResourceKind) -> Result<(), MediaError> {
        let kind = match kind {
            // Destroy needs a concrete type; images are the common case.
            ResourceKind::Auto => ResourceKind::Image,
            other => other,
        };
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let response = self
            .client
            .post(self.endpoint(kind, "destroy"))
            .form(&[
                ("public_id", public_id),
                ("api_key", self.config.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature_algorithm", "sha256"),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;
        let destroyed: DestroyResponse = Self::ensure_success(response).await?.json().await?;

        match destroyed.result.as_str() {
            "ok" | "not found" => {
                tracing::debug!(public_id, result = %destroyed.result, "Destroyed Cloudinary asset");
                Ok(())
            }
            other => Err(MediaError::Api {
                status: 200,
                body: format!("unexpected destroy result '{other}'"),
            }),
        }
    }
}

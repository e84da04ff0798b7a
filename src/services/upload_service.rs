use std::path::PathBuf;

use bytes::Bytes;
use reqwest::{multipart, Client, StatusCode};
use uuid::Uuid;

use crate::config::{ApiMode, Config};
use crate::datasource::wire::{WireError, WireUpload};
use crate::error::{Error, Result};
use crate::utils::validation::{check_upload, CheckedUpload, UploadKind};

/// Files uploaded by admins or attached to public applications.
#[derive(Clone)]
pub struct UploadService {
    mode: ApiMode,
    api_base_url: Option<String>,
    client: Client,
    uploads_dir: PathBuf,
}

impl UploadService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            mode: config.api_mode(),
            api_base_url: config
                .api_base_url
                .as_deref()
                .map(|u| u.trim_end_matches('/').to_string()),
            client,
            uploads_dir: config.uploads_dir.clone(),
        }
    }

    /// Writes to the uploads directory and returns the public `/uploads/...` path.
    pub async fn store_local(&self, folder: &str, upload: &CheckedUpload) -> Result<String> {
        let dir = self.uploads_dir.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        let name = format!("{}.{}", Uuid::new_v4(), upload.extension);
        tokio::fs::write(dir.join(&name), &upload.data).await?;
        tracing::info!(folder = %folder, file = %name, bytes = upload.data.len(), "Stored upload");
        Ok(format!("/uploads/{}/{}", folder, name))
    }

    /// Validates first; nothing is sent or written for a rejected file.
    pub async fn upload_image(
        &self,
        file_name: &str,
        data: Bytes,
        auth: Option<&str>,
    ) -> Result<String> {
        let upload = check_upload(UploadKind::Image, file_name, data)?;
        match (self.mode, self.api_base_url.as_deref()) {
            (ApiMode::Live, Some(base_url)) => self.forward_image(base_url, upload, auth).await,
            _ => self.store_local("images", &upload).await,
        }
    }

    async fn forward_image(
        &self,
        base_url: &str,
        upload: CheckedUpload,
        auth: Option<&str>,
    ) -> Result<String> {
        let part = multipart::Part::bytes(upload.data.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = multipart::Form::new().part("image", part);

        let mut request = self
            .client
            .post(format!("{}/api/admin/upload-image", base_url))
            .multipart(form);
        if let Some(token) = auth {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized("Session rejected by the API".into()));
        }
        if !status.is_success() {
            let message = response
                .json::<WireError>()
                .await
                .ok()
                .and_then(WireError::into_message)
                .unwrap_or_else(|| format!("Image upload failed ({})", status));
            return Err(Error::Rejected(message));
        }

        response
            .json::<WireUpload>()
            .await?
            .into_url()
            .ok_or_else(|| Error::Upstream("Upload response carried no url".into()))
    }
}

// Content document provisioning from a template

use crate::errors::ProvisioningError;
use crate::google::{check_status, endpoint, GoogleClient};
use crate::models::ProvisionedDocument;
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

/// Document service able to duplicate and share files
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Copy `template_id` under a new title
    async fn copy_document(
        &self,
        template_id: &str,
        title: &str,
    ) -> Result<ProvisionedDocument, ProvisioningError>;

    /// Grant edit access to anyone holding the link
    async fn share_with_link(&self, document_id: &str) -> Result<(), ProvisioningError>;
}

/// Title given to a provisioned content document
pub fn document_title(date_range: &str, topic: &str) -> String {
    format!("{} - {} - Content Doc", date_range, topic)
}

/// Creates one link-editable copy of the template per call
pub struct DocumentProvisioner {
    store: Arc<dyn DocumentStore>,
    template_id: String,
}

impl DocumentProvisioner {
    pub fn new(store: Arc<dyn DocumentStore>, template_id: impl Into<String>) -> Self {
        Self {
            store,
            template_id: template_id.into(),
        }
    }

    /// Copy the template, share it, and return the new document's address
    #[instrument(skip(self))]
    pub async fn provision(&self, date_range: &str, topic: &str) -> Result<String, ProvisioningError> {
        let title = document_title(date_range, topic);
        let document = self.store.copy_document(&self.template_id, &title).await?;
        self.store.share_with_link(&document.id).await?;

        counter!("documents_provisioned_total").increment(1);
        info!(document_id = %document.id, title = %title, "Content document provisioned");
        Ok(document.url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
}

/// Google Drive (v3 REST) document store
pub struct DriveDocumentStore {
    client: GoogleClient,
    api_base: String,
}

impl DriveDocumentStore {
    pub fn new(client: GoogleClient, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for DriveDocumentStore {
    #[instrument(skip(self))]
    async fn copy_document(
        &self,
        template_id: &str,
        title: &str,
    ) -> Result<ProvisionedDocument, ProvisioningError> {
        let url = endpoint(&self.api_base, &["drive", "v3", "files", template_id, "copy"])
            .map_err(ProvisioningError::CopyFailed)?;

        let response = self
            .client
            .post(url)
            .query(&[("fields", "id,webViewLink"), ("supportsAllDrives", "true")])
            .json(&json!({ "name": title }))
            .send()
            .await
            .map_err(|e| ProvisioningError::CopyFailed(e.to_string()))?;

        let response = check_status(response)
            .await
            .map_err(|(status, body)| ProvisioningError::Status { status, body })?;

        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| ProvisioningError::InvalidResponse(e.to_string()))?;

        let url = file
            .web_view_link
            .unwrap_or_else(|| format!("https://docs.google.com/document/d/{}/edit", file.id));

        Ok(ProvisionedDocument { id: file.id, url })
    }

    #[instrument(skip(self))]
    async fn share_with_link(&self, document_id: &str) -> Result<(), ProvisioningError> {
        let url = endpoint(
            &self.api_base,
            &["drive", "v3", "files", document_id, "permissions"],
        )
        .map_err(ProvisioningError::ShareFailed)?;

        let response = self
            .client
            .post(url)
            .query(&[("supportsAllDrives", "true")])
            .json(&json!({ "role": "writer", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| ProvisioningError::ShareFailed(e.to_string()))?;

        check_status(response)
            .await
            .map_err(|(status, body)| ProvisioningError::Status { status, body })?;
        Ok(())
    }
}

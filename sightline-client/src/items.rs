//! Item endpoints

use crate::StorageClient;
use crate::error::{ClientError, Result};
use reqwest::Method;
use sightline_core::domain::storage::ItemRef;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

impl StorageClient {
    /// List all items of a folder
    pub async fn list_folder_items(&self, folder_id: &str) -> Result<Vec<ItemRef>> {
        let response = self
            .request(Method::GET, "item")
            .query(&[("folderId", folder_id), ("limit", "0")])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Download the single file of an item to `dest_dir/name`
    ///
    /// The body is written to disk as it arrives.
    ///
    /// # Returns
    /// The local path written
    pub async fn fetch_item(&self, item_id: &str, dest_dir: &Path, name: &str) -> Result<PathBuf> {
        let response = self
            .request(Method::GET, &format!("item/{}/download", item_id))
            .send()
            .await?;
        let mut response = Self::check_status(response).await?;

        let path = dest_dir.join(name);
        let mut file = File::create(&path)
            .await
            .map_err(|e| ClientError::io(&path, e))?;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| ClientError::io(&path, e))?;
        }
        file.flush().await.map_err(|e| ClientError::io(&path, e))?;

        Ok(path)
    }

    /// Replace or merge metadata on an item
    pub async fn set_item_metadata(
        &self,
        item_id: &str,
        metadata: &serde_json::Value,
    ) -> Result<()> {
        let response = self
            .request(Method::PUT, &format!("item/{}/metadata", item_id))
            .json(metadata)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Delete an item and its files
    pub async fn remove_item(&self, item_id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("item/{}", item_id))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

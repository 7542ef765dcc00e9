//! Folder endpoints

use crate::StorageClient;
use crate::error::{ClientError, Result};
use reqwest::Method;
use sightline_core::domain::storage::FolderRef;
use std::path::{Path, PathBuf};
use tracing::debug;

impl StorageClient {
    /// List the direct subfolders of a folder
    pub async fn list_folders(&self, parent_id: &str) -> Result<Vec<FolderRef>> {
        let response = self
            .request(Method::GET, "folder")
            .query(&[
                ("parentType", "folder"),
                ("parentId", parent_id),
                ("limit", "0"),
            ])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Replace or merge metadata on a folder
    pub async fn set_folder_metadata(
        &self,
        folder_id: &str,
        metadata: &serde_json::Value,
    ) -> Result<()> {
        let response = self
            .request(Method::PUT, &format!("folder/{}/metadata", folder_id))
            .json(metadata)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Download every item of a folder tree into `dest`
    ///
    /// Subfolders become local directories of the same name.
    pub async fn download_folder_tree(&self, folder_id: &str, dest: &Path) -> Result<()> {
        let mut pending: Vec<(String, PathBuf)> = vec![(folder_id.to_string(), dest.to_path_buf())];

        while let Some((current, local_dir)) = pending.pop() {
            tokio::fs::create_dir_all(&local_dir)
                .await
                .map_err(|e| ClientError::io(&local_dir, e))?;

            for item in self.list_folder_items(&current).await? {
                self.fetch_item(&item.id, &local_dir, &item.name).await?;
            }

            for folder in self.list_folders(&current).await? {
                debug!("Descending into folder {} ({})", folder.name, folder.id);
                pending.push((folder.id, local_dir.join(&folder.name)));
            }
        }

        Ok(())
    }
}

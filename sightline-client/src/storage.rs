//! Remote storage abstraction
//!
//! The narrow interface the worker uses to fetch inputs and push results.
//! Implemented over HTTP by [`StorageClient`]; tests provide in-memory
//! implementations.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sightline_core::domain::storage::{ItemRef, UploadedFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::StorageClient;
use crate::error::Result;

/// Operations the worker needs from remote storage
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Download a folder and all of its descendants into `dest`
    async fn download_folder_recursive(&self, folder_id: &str, dest: &Path) -> Result<()>;

    /// Download one item to `dest_dir/name`, returning the local path
    async fn download_item(&self, item_id: &str, dest_dir: &Path, name: &str) -> Result<PathBuf>;

    /// Upload a local file into a folder
    async fn upload_file_to_folder(&self, folder_id: &str, path: &Path) -> Result<UploadedFile>;

    async fn add_metadata_to_item(&self, item_id: &str, metadata: JsonValue) -> Result<()>;

    async fn add_metadata_to_folder(&self, folder_id: &str, metadata: JsonValue) -> Result<()>;

    async fn delete_item(&self, item_id: &str) -> Result<()>;

    async fn list_items(&self, folder_id: &str) -> Result<Vec<ItemRef>>;

    /// Returns a handle that authenticates with `token`
    fn with_token(&self, token: &str) -> Arc<dyn RemoteStorage>;
}

#[async_trait]
impl RemoteStorage for StorageClient {
    async fn download_folder_recursive(&self, folder_id: &str, dest: &Path) -> Result<()> {
        self.download_folder_tree(folder_id, dest).await
    }

    async fn download_item(&self, item_id: &str, dest_dir: &Path, name: &str) -> Result<PathBuf> {
        self.fetch_item(item_id, dest_dir, name).await
    }

    async fn upload_file_to_folder(&self, folder_id: &str, path: &Path) -> Result<UploadedFile> {
        self.upload_to_folder(folder_id, path).await
    }

    async fn add_metadata_to_item(&self, item_id: &str, metadata: JsonValue) -> Result<()> {
        self.set_item_metadata(item_id, &metadata).await
    }

    async fn add_metadata_to_folder(&self, folder_id: &str, metadata: JsonValue) -> Result<()> {
        self.set_folder_metadata(folder_id, &metadata).await
    }

    async fn delete_item(&self, item_id: &str) -> Result<()> {
        self.remove_item(item_id).await
    }

    async fn list_items(&self, folder_id: &str) -> Result<Vec<ItemRef>> {
        self.list_folder_items(folder_id).await
    }

    fn with_token(&self, token: &str) -> Arc<dyn RemoteStorage> {
        Arc::new(self.clone().with_token(token))
    }
}

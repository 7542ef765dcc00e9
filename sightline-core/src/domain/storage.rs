//! Remote storage documents
//!
//! Minimal views of the folder, item and file documents returned by the
//! remote storage service. Only the fields the worker reads are modelled.

use serde::{Deserialize, Serialize};

/// A folder in remote storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

/// An item (a named container holding one file) in remote storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "folderId", default)]
    pub folder_id: Option<String>,
}

/// File document returned after an upload completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(default)]
    pub name: String,
}

//! File upload endpoints

use crate::StorageClient;
use crate::error::{ClientError, Result};
use reqwest::Method;
use serde::Deserialize;
use sightline_core::domain::storage::UploadedFile;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Bytes sent per upload chunk
const UPLOAD_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Pending upload returned when a non-empty file is announced
#[derive(Debug, Deserialize)]
struct Upload {
    #[serde(rename = "_id")]
    id: String,
}

impl StorageClient {
    /// Upload a local file into a folder
    ///
    /// The server creates an item named after the file. Empty files complete
    /// on announcement; others are read and sent in 32 MiB chunks.
    pub async fn upload_to_folder(&self, folder_id: &str, path: &Path) -> Result<UploadedFile> {
        self.upload_in_chunks(folder_id, path, UPLOAD_CHUNK_SIZE).await
    }

    async fn upload_in_chunks(
        &self,
        folder_id: &str,
        path: &Path,
        chunk_size: usize,
    ) -> Result<UploadedFile> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                ClientError::InvalidRequest(format!("No file name in {}", path.display()))
            })?;
        let mut file = File::open(path)
            .await
            .map_err(|e| ClientError::io(path, e))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| ClientError::io(path, e))?
            .len();

        debug!("Uploading {} ({} bytes) to folder {}", name, size, folder_id);

        let response = self
            .request(Method::POST, "file")
            .query(&[
                ("parentType", "folder"),
                ("parentId", folder_id),
                ("name", name.as_str()),
                ("size", size.to_string().as_str()),
            ])
            .send()
            .await?;

        if size == 0 {
            return self.handle_response(response).await;
        }

        let upload: Upload = self.handle_response(response).await?;
        let mut buf = vec![0u8; chunk_size];
        let mut offset: u64 = 0;

        loop {
            let read = read_chunk(&mut file, &mut buf)
                .await
                .map_err(|e| ClientError::io(path, e))?;
            if read == 0 {
                return Err(ClientError::InvalidRequest(format!(
                    "{} shrank to {} bytes during upload",
                    path.display(),
                    offset
                )));
            }

            let response = self
                .request(Method::POST, "file/chunk")
                .query(&[
                    ("uploadId", upload.id.as_str()),
                    ("offset", offset.to_string().as_str()),
                ])
                .body(buf[..read].to_vec())
                .send()
                .await?;
            offset += read as u64;

            // The last chunk answers with the finished file document
            if offset >= size {
                return self.handle_response(response).await;
            }
            self.handle_empty_response(response).await?;
        }
    }
}

/// Fills `buf` from `reader`, short only at end of input
async fn read_chunk<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let read = reader.read(&mut buf[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

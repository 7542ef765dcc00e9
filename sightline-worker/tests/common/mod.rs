//! Shared fixtures: a fake analysis toolkit, fake media tools and an
//! in-memory remote storage.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sightline_client::{ClientError, RemoteStorage};
use sightline_core::domain::storage::{ItemRef, UploadedFile};
use sightline_worker::log::BufferedJobLog;
use sightline_worker::{TaskContext, WorkerConfig};
use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const SETUP_SCRIPT: &str = r#"
VIAME_INSTALL="$(cd "$(dirname "${BASH_SOURCE[0]}")" && pwd)"
export PATH="$VIAME_INSTALL/bin:$PATH"
"#;

const KWIVER: &str = r#"#!/bin/sh
shift
pipe=""; det=""; trk=""; input=""
while [ $# -gt 0 ]; do
  case "$1" in
    -p) pipe="$2"; shift 2 ;;
    -s)
      case "$2" in
        input:video_reader:type=*) echo "reader: ${2#input:video_reader:type=}" ;;
        input:video_filename=*) input="${2#input:video_filename=}" ;;
        detector_writer:file_name=*) det="${2#detector_writer:file_name=}" ;;
        track_writer:file_name=*) trk="${2#track_writer:file_name=}" ;;
      esac
      shift 2 ;;
    *) shift ;;
  esac
done
[ -f "$pipe" ] || { echo "missing pipeline $pipe" >&2; exit 4; }
name="$(basename "$pipe")"
echo "pipeline: $name"
case "$name" in
  detector_broken*) echo "boom: pipeline crashed" >&2; exit 3 ;;
  tracker_*|trained_*) cat "$input" > "$det"; echo "1,frame.png,0,1,1,2,2,1.0,-1,fish,1.0" > "$trk" ;;
  *) cat "$input" > "$det" ;;
esac
"#;

const TRAINER: &str = r##"#!/bin/sh
input=""; conf=""
while [ $# -gt 0 ]; do
  case "$1" in
    -i) input="$2"; shift 2 ;;
    -c) conf="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "training on $input"
echo "labels: $(tr '\n' ' ' < "$input/labels.txt")"
echo "config: $(basename "$conf")"
echo "epoch 1 loss 0.5" >&2
echo "# trained detector" > detector.pipe
if ls "$input"/*/FAIL_TRAINING >/dev/null 2>&1; then
  echo "training diverged" >&2
  exit 1
fi
"##;

const FFMPEG: &str = r#"#!/bin/sh
in=""; prev=""; out=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then in="$arg"; fi
  prev="$arg"; out="$arg"
done
if [ -e "$out" ]; then echo "File '$out' already exists. Exiting." >&2; exit 1; fi
case "$in" in
  *corrupt*) echo "$in: Invalid data found when processing input" >&2; exit 1 ;;
  *broken*) cp "$in" "$out"; echo "encoder finished with errors" >&2; exit 1 ;;
esac
echo "converted $(basename "$in") -> $(basename "$out")" >&2
cp "$in" "$out"
"#;

const FFPROBE: &str = r#"#!/bin/sh
for arg in "$@"; do file="$arg"; done
case "$file" in
  *dual*) streams='{"index":0,"codec_type":"video","codec_name":"h264"},{"index":1,"codec_type":"video","codec_name":"h264"}' ;;
  *) streams='{"index":0,"codec_type":"video","codec_name":"mpeg4","width":640,"height":480},{"index":1,"codec_type":"audio","codec_name":"mp3"}' ;;
esac
printf '{"streams":[%s],"format":{"format_name":"avi"}}\n' "$streams"
"#;

pub fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Everything a task touches on the local filesystem
pub struct Fixture {
    pub toolkit: TempDir,
    pub pipelines: TempDir,
    pub trained: TempDir,
    pub scratch: TempDir,
    pub tools: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            toolkit: tempfile::tempdir().unwrap(),
            pipelines: tempfile::tempdir().unwrap(),
            trained: tempfile::tempdir().unwrap(),
            scratch: tempfile::tempdir().unwrap(),
            tools: tempfile::tempdir().unwrap(),
        };

        let root = fixture.toolkit.path();
        fs::write(root.join("setup_viame.sh"), SETUP_SCRIPT).unwrap();
        fs::create_dir(root.join("bin")).unwrap();
        write_script(&root.join("bin/kwiver"), KWIVER);
        write_script(&root.join("bin/viame_train_detector"), TRAINER);

        write_script(&fixture.tools.path().join("ffmpeg"), FFMPEG);
        write_script(&fixture.tools.path().join("ffprobe"), FFPROBE);

        fs::write(
            fixture.pipelines.path().join("train_netharn_cascade.viame_csv.conf"),
            "# training config\n",
        )
        .unwrap();

        fixture
    }

    pub fn add_pipeline(&self, name: &str) {
        fs::write(self.pipelines.path().join(name), "# pipeline\n").unwrap();
    }

    pub fn config(&self) -> WorkerConfig {
        let mut config = WorkerConfig::new(self.toolkit.path())
            .with_pipelines_path(self.pipelines.path())
            .with_trained_pipelines_path(self.trained.path())
            .with_scratch_root(self.scratch.path());
        config.ffmpeg = self.tools.path().join("ffmpeg").to_string_lossy().into_owned();
        config.ffprobe = self.tools.path().join("ffprobe").to_string_lossy().into_owned();
        config
    }

    pub fn context(&self, storage: &MemoryStorage) -> (TaskContext, BufferedJobLog) {
        self.context_with(self.config(), storage)
    }

    pub fn context_with(
        &self,
        config: WorkerConfig,
        storage: &MemoryStorage,
    ) -> (TaskContext, BufferedJobLog) {
        let log = BufferedJobLog::new();
        let ctx = TaskContext::new(config, Arc::new(storage.clone()), Arc::new(log.clone()));
        (ctx, log)
    }

    /// Names of the entries left in the scratch root
    pub fn scratch_entries(&self) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[derive(Debug, Clone)]
pub struct StoredItem {
    pub name: String,
    pub folder_id: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct StorageState {
    /// Folder id -> files as (relative path, content)
    pub folders: BTreeMap<String, Vec<(String, Vec<u8>)>>,
    pub items: BTreeMap<String, StoredItem>,
    pub uploads: Vec<(String, String)>,
    pub downloads: Vec<String>,
    pub item_metadata: Vec<(String, JsonValue)>,
    pub folder_metadata: Vec<(String, JsonValue)>,
    pub deleted: Vec<String>,
    pub tokens: Vec<String>,
    next_id: usize,
}

/// Remote storage kept in memory; clones share state
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<StorageState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_folder_file(&self, folder_id: &str, path: &str, data: &str) {
        self.state
            .lock()
            .unwrap()
            .folders
            .entry(folder_id.to_string())
            .or_default()
            .push((path.to_string(), data.as_bytes().to_vec()));
    }

    pub fn add_item(&self, id: &str, folder_id: &str, name: &str, data: &str) {
        self.state.lock().unwrap().items.insert(
            id.to_string(),
            StoredItem {
                name: name.to_string(),
                folder_id: folder_id.to_string(),
                data: data.as_bytes().to_vec(),
            },
        );
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, StorageState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl RemoteStorage for MemoryStorage {
    async fn download_folder_recursive(
        &self,
        folder_id: &str,
        dest: &Path,
    ) -> Result<(), ClientError> {
        let files = self
            .state()
            .folders
            .get(folder_id)
            .cloned()
            .ok_or_else(|| ClientError::api_error(404, format!("folder {} not found", folder_id)))?;

        for (relative, data) in files {
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| ClientError::io(parent, e))?;
            }
            fs::write(&target, data).map_err(|e| ClientError::io(&target, e))?;
        }
        Ok(())
    }

    async fn download_item(
        &self,
        item_id: &str,
        dest_dir: &Path,
        name: &str,
    ) -> Result<PathBuf, ClientError> {
        let mut state = self.state();
        let item = state
            .items
            .get(item_id)
            .cloned()
            .ok_or_else(|| ClientError::api_error(404, format!("item {} not found", item_id)))?;
        state.downloads.push(item_id.to_string());

        let target = dest_dir.join(name);
        fs::write(&target, &item.data).map_err(|e| ClientError::io(&target, e))?;
        Ok(target)
    }

    async fn upload_file_to_folder(
        &self,
        folder_id: &str,
        path: &Path,
    ) -> Result<UploadedFile, ClientError> {
        let data = fs::read(path).map_err(|e| ClientError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut state = self.state();
        state.next_id += 1;
        let item_id = format!("uploaded-{}", state.next_id);
        state.items.insert(
            item_id.clone(),
            StoredItem {
                name: name.clone(),
                folder_id: folder_id.to_string(),
                data,
            },
        );
        state.uploads.push((folder_id.to_string(), name.clone()));

        Ok(UploadedFile {
            id: format!("file-{}", state.next_id),
            item_id,
            name,
        })
    }

    async fn add_metadata_to_item(
        &self,
        item_id: &str,
        metadata: JsonValue,
    ) -> Result<(), ClientError> {
        self.state()
            .item_metadata
            .push((item_id.to_string(), metadata));
        Ok(())
    }

    async fn add_metadata_to_folder(
        &self,
        folder_id: &str,
        metadata: JsonValue,
    ) -> Result<(), ClientError> {
        self.state()
            .folder_metadata
            .push((folder_id.to_string(), metadata));
        Ok(())
    }

    async fn delete_item(&self, item_id: &str) -> Result<(), ClientError> {
        let mut state = self.state();
        state
            .items
            .remove(item_id)
            .ok_or_else(|| ClientError::api_error(404, format!("item {} not found", item_id)))?;
        state.deleted.push(item_id.to_string());
        Ok(())
    }

    async fn list_items(&self, folder_id: &str) -> Result<Vec<ItemRef>, ClientError> {
        Ok(self
            .state()
            .items
            .iter()
            .filter(|(_, item)| item.folder_id == folder_id)
            .map(|(id, item)| ItemRef {
                id: id.clone(),
                name: item.name.clone(),
                folder_id: Some(item.folder_id.clone()),
            })
            .collect())
    }

    fn with_token(&self, token: &str) -> Arc<dyn RemoteStorage> {
        self.state().tokens.push(token.to_string());
        Arc::new(self.clone())
    }
}

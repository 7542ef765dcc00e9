#![cfg(unix)]

mod common;

use common::{Fixture, MemoryStorage};
use sightline_core::domain::task::RunPipelineInput;
use sightline_worker::TaskError;
use sightline_worker::tasks::run_pipeline;
use std::fs;
use std::path::Path;

fn input(dir: &Path, pipeline: &str, media_type: &str) -> RunPipelineInput {
    RunPipelineInput {
        input_path: dir.to_path_buf(),
        pipeline: pipeline.to_string(),
        media_type: media_type.to_string(),
    }
}

#[tokio::test]
async fn test_video_run_keeps_track_output() {
    let fixture = Fixture::new();
    fixture.add_pipeline("tracker_default.pipe");
    let media = tempfile::tempdir().unwrap();
    fs::write(media.path().join("clip.mp4"), "video-bytes\n").unwrap();
    fs::write(media.path().join("previous.csv"), "stale\n").unwrap();

    let storage = MemoryStorage::new();
    let (ctx, log) = fixture.context(&storage);

    let result = run_pipeline(&ctx, &input(media.path(), "tracker_default.pipe", "video"))
        .await
        .unwrap();

    assert!(result.starts_with(fixture.scratch.path()));
    assert!(fs::read_to_string(&result).unwrap().contains("fish"));
    assert_eq!(fixture.scratch_entries().len(), 1, "detector output must be removed");

    let output = log.contents();
    assert!(output.contains("reader: vidl_ffmpeg"));
    assert!(output.contains("pipeline: tracker_default.pipe"));
}

#[tokio::test]
async fn test_image_sequence_run_lists_sorted_images() {
    let fixture = Fixture::new();
    fixture.add_pipeline("detector_default.pipe");
    let media = tempfile::tempdir().unwrap();
    for name in ["frame_2.png", "frame_0.png", "frame_1.png"] {
        fs::write(media.path().join(name), "").unwrap();
    }
    fs::write(media.path().join("groundtruth.csv"), "").unwrap();
    fs::create_dir(media.path().join("thumbnails")).unwrap();

    let storage = MemoryStorage::new();
    let (ctx, log) = fixture.context(&storage);

    let result = run_pipeline(
        &ctx,
        &input(media.path(), "detector_default.pipe", "image-sequence"),
    )
    .await
    .unwrap();

    // The detector output is a copy of the image list the runner received
    let listed: Vec<String> = fs::read_to_string(&result)
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    let expected: Vec<String> = ["frame_0.png", "frame_1.png", "frame_2.png"]
        .iter()
        .map(|name| media.path().join(name).to_string_lossy().into_owned())
        .collect();
    assert_eq!(listed, expected);

    assert!(!log.contents().contains("reader:"));
    assert_eq!(fixture.scratch_entries().len(), 1, "image list and track output must be removed");
}

#[tokio::test]
async fn test_trained_pipeline_is_resolved() {
    let fixture = Fixture::new();
    fs::write(
        fixture.trained.path().join("trained_reef_2024-01-01T10:00:00.pipe"),
        "# trained\n",
    )
    .unwrap();
    let media = tempfile::tempdir().unwrap();
    fs::write(media.path().join("clip.mp4"), "video-bytes\n").unwrap();

    let storage = MemoryStorage::new();
    let (ctx, _log) = fixture.context(&storage);

    let result = run_pipeline(
        &ctx,
        &input(media.path(), "trained_reef_2024-01-01T10:00:00.pipe", "video"),
    )
    .await
    .unwrap();

    assert!(fs::read_to_string(&result).unwrap().contains("fish"));
}

#[tokio::test]
async fn test_failed_run_reports_output_and_cleans_up() {
    let fixture = Fixture::new();
    fixture.add_pipeline("detector_broken.pipe");
    let media = tempfile::tempdir().unwrap();
    fs::write(media.path().join("clip.mp4"), "video-bytes\n").unwrap();

    let storage = MemoryStorage::new();
    let (ctx, _log) = fixture.context(&storage);

    let err = run_pipeline(&ctx, &input(media.path(), "detector_broken.pipe", "video"))
        .await
        .unwrap_err();

    match err {
        TaskError::PipelineExecutionFailed { exit_code, output } => {
            assert_eq!(exit_code, 3);
            assert!(output.contains("boom: pipeline crashed"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(fixture.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_directory_without_media_fails() {
    let fixture = Fixture::new();
    fixture.add_pipeline("detector_default.pipe");
    let media = tempfile::tempdir().unwrap();
    fs::write(media.path().join("detections.csv"), "").unwrap();

    let storage = MemoryStorage::new();
    let (ctx, log) = fixture.context(&storage);

    let err = run_pipeline(&ctx, &input(media.path(), "detector_default.pipe", "video"))
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::NoMediaFound { .. }));
    assert!(log.is_empty(), "runner must not be invoked");
    assert!(fixture.scratch_entries().is_empty());
}

#[tokio::test]
async fn test_unknown_media_type_fails() {
    let fixture = Fixture::new();
    fixture.add_pipeline("detector_default.pipe");
    let media = tempfile::tempdir().unwrap();
    fs::write(media.path().join("clip.wav"), "").unwrap();

    let storage = MemoryStorage::new();
    let (ctx, log) = fixture.context(&storage);

    let err = run_pipeline(&ctx, &input(media.path(), "detector_default.pipe", "audio"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unknown input type: audio");
    assert!(log.is_empty());
    assert!(fixture.scratch_entries().is_empty());
}

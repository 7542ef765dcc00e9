//! Command builder
//!
//! Builds the exact invocations of the external tools. Commands that need the
//! toolkit environment go through `bash -c` after sourcing the toolkit's
//! setup script; every path interpolated into such a script is quoted with
//! [`shell_quote`].

use std::path::{Path, PathBuf};

/// Shell used for toolkit invocations
pub const SHELL: &str = "bash";

/// Environment script at the toolkit root
pub const SETUP_SCRIPT: &str = "setup_viame.sh";

/// Trainer executable, relative to the toolkit root
pub const TRAINER: &str = "bin/viame_train_detector";

/// Training configuration, relative to the pipelines directory
pub const TRAINING_CONFIG: &str = "train_netharn_cascade.viame_csv.conf";

/// Video reader the runner uses for container formats
const VIDEO_READER: &str = "vidl_ffmpeg";

/// A fully specified process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Single-line rendering for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What the analysis runner reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineSource {
    /// A single video file
    Video(PathBuf),
    /// A text file listing image paths, one per line
    ImageList(PathBuf),
}

impl PipelineSource {
    pub fn path(&self) -> &Path {
        match self {
            PipelineSource::Video(path) | PipelineSource::ImageList(path) => path,
        }
    }
}

/// Quotes a value for a POSIX shell
///
/// The value is wrapped in single quotes; embedded single quotes are closed,
/// escaped and reopened.
pub fn shell_quote(value: impl AsRef<std::ffi::OsStr>) -> String {
    let value = value.as_ref().to_string_lossy();
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Analysis runner invocation
///
/// ```text
/// bash -c "cd <toolkit> && . ./setup_viame.sh && kwiver runner
///     [-s input:video_reader:type=vidl_ffmpeg] -p <pipeline>
///     -s input:video_filename=<source>
///     -s detector_writer:file_name=<detections>
///     -s track_writer:file_name=<tracks>"
/// ```
pub fn pipeline_runner(
    toolkit_root: &Path,
    pipeline: &Path,
    source: &PipelineSource,
    detector_output: &Path,
    track_output: &Path,
) -> CommandSpec {
    let mut script = vec![
        format!("cd {}", shell_quote(toolkit_root)),
        "&&".to_string(),
        format!(". ./{}", SETUP_SCRIPT),
        "&&".to_string(),
        "kwiver runner".to_string(),
    ];

    if matches!(source, PipelineSource::Video(_)) {
        script.push(format!("-s input:video_reader:type={}", VIDEO_READER));
    }

    script.push(format!("-p {}", shell_quote(pipeline)));
    script.push(format!(
        "-s input:video_filename={}",
        shell_quote(source.path())
    ));
    script.push(format!(
        "-s detector_writer:file_name={}",
        shell_quote(detector_output)
    ));
    script.push(format!(
        "-s track_writer:file_name={}",
        shell_quote(track_output)
    ));

    CommandSpec::new(SHELL).arg("-c").arg(script.join(" "))
}

/// Trainer invocation, run from `cwd` so the trainer writes its outputs there
///
/// Python output buffering is disabled so progress reaches the job log while
/// training runs.
pub fn trainer(
    toolkit_root: &Path,
    input_dir: &Path,
    config_file: &Path,
    cwd: &Path,
) -> CommandSpec {
    let script = format!(
        ". {} && {} -i {} -c {}",
        shell_quote(toolkit_root.join(SETUP_SCRIPT)),
        shell_quote(toolkit_root.join(TRAINER)),
        shell_quote(input_dir),
        shell_quote(config_file),
    );

    CommandSpec::new(SHELL)
        .arg("-c")
        .arg(script)
        .current_dir(cwd)
        .env("PYTHONUNBUFFERED", "1")
}

/// Media probe printing format and stream information as JSON
pub fn probe(ffprobe: &str, file: &Path) -> CommandSpec {
    CommandSpec::new(ffprobe)
        .args([
            "-print_format",
            "json",
            "-v",
            "quiet",
            "-show_format",
            "-show_streams",
        ])
        .arg(file)
}

/// H.264 transcode keeping the audio streams as they are
pub fn transcode_video(ffmpeg: &str, input: &Path, output: &Path) -> CommandSpec {
    CommandSpec::new(ffmpeg)
        .arg("-i")
        .arg(input)
        .args(["-c:v", "libx264", "-preset", "slow", "-crf", "26", "-c:a", "copy"])
        .arg(output)
}

/// Image conversion; the output format follows the output extension
pub fn transcode_image(ffmpeg: &str, input: &Path, output: &Path) -> CommandSpec {
    CommandSpec::new(ffmpeg).arg("-i").arg(input).arg(output)
}

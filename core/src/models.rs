//! Model download and management.
//!
//! Resolves the model names accepted on the command line to ggml weights
//! files, downloading them into the models directory on first use.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};

const WHISPER_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Read granularity for the download stream.
const DOWNLOAD_CHUNK_BYTES: usize = 1024 * 1024;

/// Errors from resolving or downloading model weights.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(
        "unknown model name: {name} (expected one of: tiny, base, small, medium, large, large-v2, large-v3)"
    )]
    UnknownName { name: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("model file I/O error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to download model from {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read download stream from {url}")]
    Stream {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("model download failed: HTTP {status} from {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("downloaded model size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}

/// Model size tier selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelName {
    /// Tiny multilingual model (~75MB).
    Tiny,
    /// Base multilingual model (~150MB).
    Base,
    /// Small multilingual model (~500MB).
    Small,
    /// Medium multilingual model (~1.5GB).
    Medium,
    /// Alias for the newest large checkpoint (~3GB).
    Large,
    /// Large-v2 checkpoint (~3GB).
    LargeV2,
    /// Large-v3 checkpoint (~3GB).
    LargeV3,
}

impl FromStr for ModelName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(ModelName::Tiny),
            "base" => Ok(ModelName::Base),
            "small" => Ok(ModelName::Small),
            "medium" => Ok(ModelName::Medium),
            "large" => Ok(ModelName::Large),
            "large-v2" => Ok(ModelName::LargeV2),
            "large-v3" => Ok(ModelName::LargeV3),
            _ => Err(ModelError::UnknownName {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelName::Tiny => "tiny",
            ModelName::Base => "base",
            ModelName::Small => "small",
            ModelName::Medium => "medium",
            ModelName::Large => "large",
            ModelName::LargeV2 => "large-v2",
            ModelName::LargeV3 => "large-v3",
        };
        f.write_str(name)
    }
}

impl ModelName {
    /// Get model metadata. `large` resolves to the large-v3 weights, the
    /// newest checkpoint, matching the alias in the upstream registry.
    fn info(&self) -> ModelInfo {
        match self {
            ModelName::Tiny => ModelInfo {
                filename: "ggml-tiny.bin",
                url: format!("{}/ggml-tiny.bin", WHISPER_BASE_URL),
                size_bytes: Some(77_691_713),
            },
            ModelName::Base => ModelInfo {
                filename: "ggml-base.bin",
                url: format!("{}/ggml-base.bin", WHISPER_BASE_URL),
                size_bytes: Some(147_951_465),
            },
            ModelName::Small => ModelInfo {
                filename: "ggml-small.bin",
                url: format!("{}/ggml-small.bin", WHISPER_BASE_URL),
                size_bytes: Some(487_601_967),
            },
            ModelName::Medium => ModelInfo {
                filename: "ggml-medium.bin",
                url: format!("{}/ggml-medium.bin", WHISPER_BASE_URL),
                size_bytes: Some(1_533_774_781),
            },
            ModelName::Large | ModelName::LargeV3 => ModelInfo {
                filename: "ggml-large-v3.bin",
                url: format!("{}/ggml-large-v3.bin", WHISPER_BASE_URL),
                size_bytes: Some(3_094_623_691),
            },
            ModelName::LargeV2 => ModelInfo {
                filename: "ggml-large-v2.bin",
                url: format!("{}/ggml-large-v2.bin", WHISPER_BASE_URL),
                size_bytes: None,
            },
        }
    }
}

/// Metadata for a downloadable model.
struct ModelInfo {
    /// Filename to save as.
    filename: &'static str,
    /// Download URL.
    url: String,
    /// Expected file size for validation (optional).
    size_bytes: Option<u64>,
}

/// State of a model file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    /// File absent.
    Missing,
    /// File present with the expected size (or no expected size recorded).
    Ready,
    /// File present but its size differs from the expected size.
    Corrupted,
}

/// Manages model downloads and storage.
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Create a ModelManager using the default models directory.
    ///
    /// Default: `~/.local/share/whisper-json/models/`
    pub fn new() -> Result<Self, ModelError> {
        Ok(Self {
            models_dir: Config::default_models_dir()?,
        })
    }

    /// Create a ModelManager with the models directory from a config.
    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        Ok(Self {
            models_dir: config.models_dir()?,
        })
    }

    /// Create a ModelManager with a custom models directory.
    pub fn with_dir(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// Get the models directory path.
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Get the on-disk path a model resolves to, whether or not it exists.
    pub fn model_path(&self, model: ModelName) -> PathBuf {
        self.models_dir.join(model.info().filename)
    }

    /// Check the state of a model file without touching the network.
    pub fn check_model(&self, model: ModelName) -> Result<ModelStatus, ModelError> {
        let info = model.info();
        let path = self.models_dir.join(info.filename);

        if !path.exists() {
            return Ok(ModelStatus::Missing);
        }

        let Some(expected) = info.size_bytes else {
            return Ok(ModelStatus::Ready);
        };

        let metadata = fs::metadata(&path).map_err(|source| ModelError::Io {
            path: path.clone(),
            source,
        })?;

        if metadata.len() == expected {
            Ok(ModelStatus::Ready)
        } else {
            Ok(ModelStatus::Corrupted)
        }
    }

    /// Ensure a model is available, downloading if necessary.
    ///
    /// Returns the path to the model file.
    pub fn ensure_model(&self, model: ModelName) -> Result<PathBuf, ModelError> {
        let info = model.info();
        let path = self.models_dir.join(info.filename);

        match self.check_model(model)? {
            ModelStatus::Ready => {
                debug!(path = %path.display(), "Model already exists");
                return Ok(path);
            }
            ModelStatus::Corrupted => {
                warn!(
                    model = %model,
                    path = %path.display(),
                    "Model size mismatch, re-downloading"
                );
                fs::remove_file(&path).map_err(|source| ModelError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
            ModelStatus::Missing => {}
        }

        self.download_model(&info, &path)?;
        Ok(path)
    }

    /// Download a model from its URL.
    fn download_model(&self, info: &ModelInfo, dest: &Path) -> Result<(), ModelError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| ModelError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        info!(
            url = %info.url,
            dest = %dest.display(),
            "Downloading model"
        );

        let mut response =
            reqwest::blocking::get(&info.url).map_err(|source| ModelError::Request {
                url: info.url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ModelError::HttpStatus {
                status: response.status(),
                url: info.url.clone(),
            });
        }

        let progress = match response.content_length().or(info.size_bytes) {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) =
            ProgressStyle::with_template("{msg} [{bar:40}] {bytes}/{total_bytes} ({eta})")
        {
            progress.set_style(style.progress_chars("=> "));
        }
        progress.set_message(info.filename);

        // Write to a temporary file first, then rename (atomic)
        let temp_path = dest.with_extension("tmp");
        let result = self.stream_to_file(&mut response, &temp_path, info, &progress);
        progress.finish_and_clear();

        let downloaded = match result {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        fs::rename(&temp_path, dest).map_err(|source| ModelError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        info!(
            path = %dest.display(),
            size = downloaded,
            "Model downloaded successfully"
        );

        Ok(())
    }

    /// Stream the response body into `temp_path`, returning the byte count.
    fn stream_to_file(
        &self,
        response: &mut reqwest::blocking::Response,
        temp_path: &Path,
        info: &ModelInfo,
        progress: &ProgressBar,
    ) -> Result<u64, ModelError> {
        let mut file = fs::File::create(temp_path).map_err(|source| ModelError::Io {
            path: temp_path.to_path_buf(),
            source,
        })?;

        let mut downloaded: u64 = 0;
        let mut buf = vec![0u8; DOWNLOAD_CHUNK_BYTES];
        loop {
            let n = response.read(&mut buf).map_err(|source| ModelError::Stream {
                url: info.url.clone(),
                source,
            })?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).map_err(|source| ModelError::Io {
                path: temp_path.to_path_buf(),
                source,
            })?;
            downloaded += n as u64;
            progress.set_position(downloaded);
        }

        file.sync_all().map_err(|source| ModelError::Io {
            path: temp_path.to_path_buf(),
            source,
        })?;

        if let Some(expected) = info.size_bytes {
            if downloaded != expected {
                return Err(ModelError::SizeMismatch {
                    expected,
                    actual: downloaded,
                });
            }
        }

        Ok(downloaded)
    }
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;

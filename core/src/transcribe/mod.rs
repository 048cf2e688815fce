//! Speech-to-text transcription.
//!
//! This module provides a trait abstraction for transcription backends
//! and the whisper.cpp implementation.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::AudioError;

mod whisper;

pub use whisper::WhisperTranscriber;

/// A contiguous span of recognized speech.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Recognized text, trimmed of surrounding whitespace.
    pub text: String,
}

/// Errors from loading a model or transcribing audio.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("model file not found at {}", .path.display())]
    ModelNotFound { path: PathBuf },
    #[error("model path is not valid UTF-8: {}", .path.display())]
    InvalidModelPath { path: PathBuf },
    #[error("failed to load model from {}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: whisper_rs::WhisperError,
    },
    #[error("failed to initialize whisper state")]
    StateInit(#[source] whisper_rs::WhisperError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("whisper inference failed")]
    Inference(#[source] whisper_rs::WhisperError),
}

/// Speech-to-text transcriber.
///
/// Implementations read an audio file and produce ordered segments.
pub trait Transcriber: Send {
    /// Transcribe the audio file at `audio_path`.
    ///
    /// `language` is a short code such as "en" or "zh"; "auto" selects
    /// engine-side language detection. Segments come back ordered by
    /// start time with their text trimmed.
    fn transcribe(
        &mut self,
        audio_path: &Path,
        language: &str,
    ) -> Result<Vec<Segment>, TranscribeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test double that returns canned segments for any existing file.
    struct FixedTranscriber {
        segments: Vec<Segment>,
    }

    impl Transcriber for FixedTranscriber {
        fn transcribe(
            &mut self,
            audio_path: &Path,
            _language: &str,
        ) -> Result<Vec<Segment>, TranscribeError> {
            if !audio_path.exists() {
                return Err(TranscribeError::Audio(AudioError::NotFound {
                    path: audio_path.to_path_buf(),
                }));
            }
            Ok(self.segments.clone())
        }
    }

    fn sample_segments() -> Vec<Segment> {
        vec![
            Segment {
                start: 0.0,
                end: 1.2,
                text: "Hello".to_string(),
            },
            Segment {
                start: 1.2,
                end: 2.5,
                text: "world".to_string(),
            },
        ]
    }

    #[test]
    fn test_segment_serializes_exactly_three_keys() {
        let segment = Segment {
            start: 0.0,
            end: 1.2,
            text: "Hello".to_string(),
        };

        let value = serde_json::to_value(&segment).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert!(object.contains_key("start"));
        assert!(object.contains_key("end"));
        assert!(object.contains_key("text"));
    }

    #[test]
    fn test_trait_object_dispatch() {
        let temp = tempfile::TempDir::new().unwrap();
        let audio_path = temp.path().join("speech.wav");
        std::fs::write(&audio_path, b"stub").unwrap();

        let mut transcriber: Box<dyn Transcriber> = Box::new(FixedTranscriber {
            segments: sample_segments(),
        });

        let segments = transcriber.transcribe(&audio_path, "en").unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello");
        assert!(segments[0].start <= segments[1].start);
    }

    #[test]
    fn test_missing_file_surfaces_not_found() {
        let mut transcriber = FixedTranscriber {
            segments: sample_segments(),
        };

        let err = transcriber
            .transcribe(Path::new("missing.wav"), "en")
            .unwrap_err();

        assert!(matches!(
            err,
            TranscribeError::Audio(AudioError::NotFound { .. })
        ));
        assert!(err.to_string().contains("missing.wav"));
    }
}

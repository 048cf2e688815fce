//! Whisper transcription backend.
//!
//! Uses whisper.cpp via whisper-rs for speech-to-text.

use std::path::Path;
use tracing::{debug, info};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

use super::{Segment, TranscribeError, Transcriber};
use crate::audio;

/// Upper bound for whisper.cpp worker threads.
const MAX_THREADS: usize = 4;

/// Whisper speech-to-text transcriber.
///
/// The underlying WhisperContext is leaked intentionally: the model stays
/// loaded for the process lifetime, which avoids self-referential struct
/// patterns while allowing the state to be reused across calls.
#[derive(Debug)]
pub struct WhisperTranscriber {
    state: WhisperState,
}

impl WhisperTranscriber {
    /// Load a Whisper GGML model from `model_path`.
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self, TranscribeError> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(TranscribeError::ModelNotFound {
                path: model_path.to_path_buf(),
            });
        }

        let path_str = model_path
            .to_str()
            .ok_or_else(|| TranscribeError::InvalidModelPath {
                path: model_path.to_path_buf(),
            })?;

        info!(path = %model_path.display(), "Loading Whisper model");

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|source| TranscribeError::ModelLoad {
                path: model_path.to_path_buf(),
                source,
            })?;

        // Box and leak the context to get a 'static reference. The model
        // stays loaded until process exit.
        let ctx_ref: &'static WhisperContext = Box::leak(Box::new(ctx));

        let state = ctx_ref.create_state().map_err(TranscribeError::StateInit)?;

        info!("Whisper model and state loaded");

        Ok(Self { state })
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(
        &mut self,
        audio_path: &Path,
        language: &str,
    ) -> Result<Vec<Segment>, TranscribeError> {
        let samples = audio::load_audio(audio_path)?;

        debug!(
            samples = samples.len(),
            duration_secs = samples.len() as f32 / audio::TARGET_SAMPLE_RATE as f32,
            language = language,
            "Transcribing audio with Whisper"
        );

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_translate(false);

        // Keep whisper.cpp from printing to the process streams
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().min(MAX_THREADS))
            .unwrap_or(1);
        params.set_n_threads(threads as i32);

        self.state
            .full(params, &samples)
            .map_err(TranscribeError::Inference)?;

        let num_segments = self.state.full_n_segments();
        let mut segments = Vec::new();

        for i in 0..num_segments {
            let Some(segment) = self.state.get_segment(i) else {
                continue;
            };
            let Ok(text) = segment.to_str_lossy() else {
                continue;
            };
            // Segment timestamps are reported in centiseconds
            segments.push(Segment {
                start: segment.start_timestamp() as f64 / 100.0,
                end: segment.end_timestamp() as f64 / 100.0,
                text: text.trim().to_string(),
            });
        }

        debug!(segments = segments.len(), "Transcription complete");

        Ok(segments)
    }
}

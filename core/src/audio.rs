//! Audio file loading and conversion.
//!
//! Reads WAV input and converts it to the 16kHz mono f32 stream the
//! speech model consumes.

use audioadapter_buffers::direct::SequentialSliceOfVecs;
use rubato::audioadapter::Adapter;
use rubato::{Fft, FixedSync, Resampler};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Target sample rate for speech recognition models.
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Input samples per resampler chunk.
const RESAMPLE_CHUNK_SIZE: usize = 1024;

/// Errors from reading or converting audio input.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio file not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read audio file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("audio file {} contains no samples", .path.display())]
    Empty { path: PathBuf },
    #[error("failed to create resampler")]
    ResamplerInit(#[from] rubato::ResamplerConstructionError),
    #[error("resampling failed")]
    Resample(#[from] rubato::ResampleError),
}

/// Audio buffer containing mono f32 samples at a known sample rate.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new audio buffer.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration of the buffer in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Convert multi-channel interleaved samples to mono by averaging all channels.
pub fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels == 1 {
        return samples.to_vec();
    }

    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Read a WAV file into a mono buffer at its native sample rate.
///
/// Integer PCM of any bit depth is scaled to [-1.0, 1.0]; float samples
/// pass through unchanged. Multi-channel audio is averaged down to mono.
pub fn read_wav_file(path: impl AsRef<Path>) -> Result<AudioBuffer, AudioError> {
    let path = path.as_ref();

    let mut reader = hound::WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
            AudioError::NotFound {
                path: path.to_path_buf(),
            }
        }
        other => AudioError::Read {
            path: path.to_path_buf(),
            source: other,
        },
    })?;

    let spec = reader.spec();
    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let max_value = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect()
        }
    };
    let samples = samples.map_err(|source| AudioError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let buffer = AudioBuffer::new(to_mono(&samples, spec.channels), spec.sample_rate);

    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        duration_secs = buffer.duration_secs(),
        "Read WAV file"
    );

    Ok(buffer)
}

/// Resampler for converting audio between sample rates.
pub struct AudioResampler {
    resampler: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
    chunk_size_in: usize,
}

impl AudioResampler {
    /// Create a new resampler.
    ///
    /// # Arguments
    /// * `input_rate` - Input sample rate in Hz
    /// * `output_rate` - Output sample rate in Hz
    /// * `chunk_size` - Number of input samples per processing chunk
    pub fn new(input_rate: u32, output_rate: u32, chunk_size: usize) -> Result<Self, AudioError> {
        let resampler = Fft::new(
            input_rate as usize,
            output_rate as usize,
            chunk_size,
            1, // sub_chunks
            1, // channels
            FixedSync::Input,
        )?;

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            chunk_size_in: chunk_size,
        })
    }

    /// Resample a complete buffer.
    ///
    /// The final partial chunk is zero-padded, and the resampler's inherent
    /// delay is flushed and trimmed, so the output length corresponds to the
    /// input length scaled by the rate ratio.
    pub fn process_all(&mut self, input: &[f32]) -> Result<Vec<f32>, AudioError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let expected_len =
            (input.len() as u64 * self.output_rate as u64 / self.input_rate as u64) as usize;
        let delay = self.resampler.output_delay();

        let mut output = Vec::with_capacity(delay + expected_len);

        let mut chunks = input.chunks_exact(self.chunk_size_in);
        for chunk in chunks.by_ref() {
            self.process_chunk(chunk, &mut output)?;
        }

        let remainder = chunks.remainder();
        if !remainder.is_empty() {
            let mut padded = remainder.to_vec();
            padded.resize(self.chunk_size_in, 0.0);
            self.process_chunk(&padded, &mut output)?;
        }

        // Feed silence until the tail of the real signal has cleared the
        // resampler's internal delay.
        let zeros = vec![0.0f32; self.chunk_size_in];
        while output.len() < delay + expected_len {
            let before = output.len();
            self.process_chunk(&zeros, &mut output)?;
            if output.len() == before {
                break;
            }
        }

        let end = (delay + expected_len).min(output.len());
        let start = delay.min(end);
        Ok(output[start..end].to_vec())
    }

    fn process_chunk(&mut self, chunk: &[f32], output: &mut Vec<f32>) -> Result<(), AudioError> {
        let input_vecs = vec![chunk.to_vec()];
        let input_adapter =
            SequentialSliceOfVecs::new(&input_vecs, 1, chunk.len()).expect("valid input");
        let resampled = self.resampler.process(&input_adapter, 0, None)?;

        for frame_idx in 0..resampled.frames() {
            output.push(resampled.read_sample(0, frame_idx).unwrap_or(0.0));
        }

        Ok(())
    }
}

/// Load a WAV file as 16kHz mono f32 samples, resampling if needed.
pub fn load_audio(path: impl AsRef<Path>) -> Result<Vec<f32>, AudioError> {
    let path = path.as_ref();
    let buffer = read_wav_file(path)?;

    if buffer.samples.is_empty() {
        return Err(AudioError::Empty {
            path: path.to_path_buf(),
        });
    }

    if buffer.sample_rate == TARGET_SAMPLE_RATE {
        return Ok(buffer.samples);
    }

    debug!(
        from = buffer.sample_rate,
        to = TARGET_SAMPLE_RATE,
        "Resampling audio"
    );

    let mut resampler =
        AudioResampler::new(buffer.sample_rate, TARGET_SAMPLE_RATE, RESAMPLE_CHUNK_SIZE)?;
    resampler.process_all(&buffer.samples)
}

#[cfg(test)]
#[path = "audio_test.rs"]
mod tests;

use super::*;
use tempfile::TempDir;

fn write_wav_i16(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn write_wav_f32(path: &Path, sample_rate: u32, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn sine(len: usize, freq: f32, sample_rate: f32) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
        .collect()
}

#[test]
fn test_audio_buffer_duration() {
    // 16000 samples at 16kHz = 1 second
    let buffer = AudioBuffer::new(vec![0.0; 16000], 16000);
    assert!((buffer.duration_secs() - 1.0).abs() < f32::EPSILON);

    let buffer = AudioBuffer::new(vec![0.0; 8000], 16000);
    assert!((buffer.duration_secs() - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_to_mono_passthrough() {
    let samples = vec![0.1, 0.2, 0.3];
    let mono = to_mono(&samples, 1);

    assert_eq!(mono, samples);
}

#[test]
fn test_to_mono_stereo() {
    let stereo = vec![0.2, 0.4, 0.6, 0.8];
    let mono = to_mono(&stereo, 2);

    assert_eq!(mono.len(), 2);
    assert!((mono[0] - 0.3).abs() < f32::EPSILON);
    assert!((mono[1] - 0.7).abs() < f32::EPSILON);
}

#[test]
fn test_to_mono_quad() {
    // 4 channels: average of 0.1, 0.2, 0.3, 0.4 = 0.25
    let quad = vec![0.1, 0.2, 0.3, 0.4];
    let mono = to_mono(&quad, 4);

    assert_eq!(mono.len(), 1);
    assert!((mono[0] - 0.25).abs() < f32::EPSILON);
}

#[test]
fn test_read_wav_16bit_scaling() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tone.wav");
    write_wav_i16(&path, 16000, 1, &[0, 16384, -16384, 32767]);

    let buffer = read_wav_file(&path).unwrap();

    assert_eq!(buffer.sample_rate, 16000);
    assert_eq!(buffer.samples.len(), 4);
    assert!((buffer.samples[0] - 0.0).abs() < 1e-6);
    assert!((buffer.samples[1] - 0.5).abs() < 1e-6);
    assert!((buffer.samples[2] + 0.5).abs() < 1e-6);
    assert!(buffer.samples[3] <= 1.0);
}

#[test]
fn test_read_wav_8bit_scaling() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tone8.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    writer.write_sample(64_i8).unwrap();
    writer.finalize().unwrap();

    let buffer = read_wav_file(&path).unwrap();
    assert!((buffer.samples[0] - 0.5).abs() < 1e-6);
}

#[test]
fn test_read_wav_float_passthrough() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("float.wav");
    write_wav_f32(&path, 16000, &[0.25, -0.75]);

    let buffer = read_wav_file(&path).unwrap();

    assert!((buffer.samples[0] - 0.25).abs() < f32::EPSILON);
    assert!((buffer.samples[1] + 0.75).abs() < f32::EPSILON);
}

#[test]
fn test_read_wav_stereo_downmix() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("stereo.wav");
    // L=16384, R=0 -> mono 8192/32768 = 0.25
    write_wav_i16(&path, 44100, 2, &[16384, 0, 0, 16384]);

    let buffer = read_wav_file(&path).unwrap();

    assert_eq!(buffer.samples.len(), 2);
    assert!((buffer.samples[0] - 0.25).abs() < 1e-6);
    assert!((buffer.samples[1] - 0.25).abs() < 1e-6);
}

#[test]
fn test_read_wav_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.wav");

    let err = read_wav_file(&path).unwrap_err();

    assert!(matches!(err, AudioError::NotFound { .. }));
    assert!(err.to_string().contains("missing.wav"));
}

#[test]
fn test_read_wav_rejects_garbage() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("garbage.wav");
    std::fs::write(&path, b"definitely not a RIFF header").unwrap();

    let err = read_wav_file(&path).unwrap_err();

    assert!(matches!(err, AudioError::Read { .. }));
}

#[test]
fn test_resampler_downsample_length() {
    let mut resampler = AudioResampler::new(48000, 16000, 1024).unwrap();
    let input = sine(4800, 1000.0, 48000.0);

    let output = resampler.process_all(&input).unwrap();

    // 4800 * 16000/48000 = 1600
    assert_eq!(output.len(), 1600);

    let max_amplitude = output.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    assert!(
        max_amplitude > 0.5,
        "Output amplitude too low: {}",
        max_amplitude
    );
}

#[test]
fn test_resampler_upsample_length() {
    let mut resampler = AudioResampler::new(16000, 48000, 1024).unwrap();
    let input = sine(1600, 1000.0, 16000.0);

    let output = resampler.process_all(&input).unwrap();

    assert_eq!(output.len(), 4800);
}

#[test]
fn test_resampler_partial_chunk_length() {
    // 1000 samples is not a multiple of the chunk size
    let mut resampler = AudioResampler::new(44100, 16000, 1024).unwrap();
    let input = sine(1000, 440.0, 44100.0);

    let output = resampler.process_all(&input).unwrap();

    // floor(1000 * 16000/44100) = 362
    assert_eq!(output.len(), 362);
}

#[test]
fn test_resampler_empty_input() {
    let mut resampler = AudioResampler::new(48000, 16000, 1024).unwrap();
    let output = resampler.process_all(&[]).unwrap();

    assert!(output.is_empty());
}

#[test]
fn test_load_audio_at_target_rate() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("native.wav");
    write_wav_i16(&path, TARGET_SAMPLE_RATE, 1, &[100; 320]);

    let samples = load_audio(&path).unwrap();

    assert_eq!(samples.len(), 320);
}

#[test]
fn test_load_audio_resamples_other_rates() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("hi-rate.wav");
    let input: Vec<i16> = sine(4800, 1000.0, 48000.0)
        .iter()
        .map(|s| (s * 16384.0) as i16)
        .collect();
    write_wav_i16(&path, 48000, 1, &input);

    let samples = load_audio(&path).unwrap();

    assert_eq!(samples.len(), 1600);
}

#[test]
fn test_load_audio_rejects_empty_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.wav");
    write_wav_i16(&path, 16000, 1, &[]);

    let err = load_audio(&path).unwrap_err();

    assert!(matches!(err, AudioError::Empty { .. }));
}

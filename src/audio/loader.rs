//! Source file loading
//!
//! Turns a supported source file into a canonical [`AudioBuffer`]:
//! - WAV files are decoded with hound
//! - Compressed audio (MP3, Ogg, FLAC, M4A) is decoded with symphonia
//! - Video containers have their audio track extracted losslessly to a
//!   temporary WAV with ffmpeg, then follow the WAV path
//!
//! Whatever the source, the decoded stream is down-mixed to mono and
//! resampled to 16 kHz before a buffer is returned. Loads are user-triggered
//! and never cached; repeating a load repeats the full decode.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use hound::{SampleFormat, WavReader};
use log::{debug, info};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tempfile::NamedTempFile;

use crate::audio::buffer::{AudioBuffer, SAMPLE_RATE};
use crate::error::LoadError;

/// Extensions decoded directly with hound
const WAV_EXTENSIONS: &[&str] = &["wav"];

/// Extensions decoded with symphonia
const COMPRESSED_EXTENSIONS: &[&str] = &["mp3", "ogg", "flac", "m4a", "aac"];

/// Video container extensions; the audio track is extracted first
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Wav,
    Compressed,
    Video,
}

/// Load a source file and normalize it to a mono 16 kHz buffer.
///
/// # Errors
/// * `LoadError::Unsupported` - the extension is not recognized (checked
///   before any decode attempt)
/// * `LoadError::DecodeFailed` - the stream is corrupt or unreadable, or
///   the video container has no extractable audio track
/// * `LoadError::Empty` - the decoded stream yields zero samples
pub fn load<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, LoadError> {
    let path = path.as_ref();
    let kind = classify(path)?;
    info!("Loading {} ({:?})", path.display(), kind);

    match kind {
        SourceKind::Wav => decode_wav(path),
        SourceKind::Compressed => decode_compressed(path),
        SourceKind::Video => {
            // The temp file is owned by this scope: it is removed when
            // `extracted` drops, on success and on every error path.
            let extracted = extract_video_audio(path)?;
            decode_wav(extracted.path())
        }
    }
}

fn classify(path: &Path) -> Result<SourceKind, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if WAV_EXTENSIONS.contains(&extension.as_str()) {
        Ok(SourceKind::Wav)
    } else if COMPRESSED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(SourceKind::Compressed)
    } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Ok(SourceKind::Video)
    } else {
        Err(LoadError::Unsupported {
            format: if extension.is_empty() {
                format!("{} (no file extension)", path.display())
            } else {
                format!(".{extension}")
            },
        })
    }
}

/// Extract the audio track of a video container to a temporary WAV.
///
/// Uses `pcm_s16le` so no further quality is lost between the container's
/// decoded audio and our resampling step.
fn extract_video_audio(path: &Path) -> Result<NamedTempFile, LoadError> {
    let temp = tempfile::Builder::new()
        .prefix("voxmatch-extract-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| LoadError::DecodeFailed {
            reason: format!("failed to create temporary file for audio extraction: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(
        "Extracting audio track from {} to {}",
        path.display(),
        temp.path().display()
    );

    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(path)
        .args(["-vn", "-acodec", "pcm_s16le"])
        .arg(temp.path())
        .output()
        .map_err(|e| LoadError::DecodeFailed {
            reason: format!("failed to run ffmpeg for audio extraction: {e}"),
            source: Some(Box::new(e)),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LoadError::DecodeFailed {
            reason: format!(
                "ffmpeg could not extract an audio track from {}: {}",
                path.display(),
                stderr.lines().last().unwrap_or("unknown error").trim()
            ),
            source: None,
        });
    }

    Ok(temp)
}

fn decode_wav(path: &Path) -> Result<AudioBuffer, LoadError> {
    let reader = WavReader::open(path).map_err(|e| LoadError::DecodeFailed {
        reason: format!("failed to open WAV file {}: {e}", path.display()),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let source_rate = spec.sample_rate;

    let samples = read_wav_samples(reader, spec.bits_per_sample, spec.sample_format)?;
    normalize(&samples, channels, source_rate)
}

/// Read WAV samples and convert to f32 regardless of stored format
fn read_wav_samples<R: std::io::Read>(
    reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>, LoadError> {
    fn decode_failed(e: hound::Error) -> LoadError {
        LoadError::DecodeFailed {
            reason: format!("failed to read samples: {e}"),
            source: Some(Box::new(e)),
        }
    }

    match sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map_err(decode_failed))
            .collect(),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .into_samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0).map_err(decode_failed))
                .collect(),
            16 => reader
                .into_samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0).map_err(decode_failed))
                .collect(),
            24 => reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8_388_608.0).map_err(decode_failed))
                .collect(),
            32 => reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2_147_483_648.0).map_err(decode_failed))
                .collect(),
            other => Err(LoadError::Unsupported {
                format: format!("{other}-bit integer WAV"),
            }),
        },
    }
}

fn decode_compressed(path: &Path) -> Result<AudioBuffer, LoadError> {
    let decode_failed = |reason: String, e: SymphoniaError| LoadError::DecodeFailed {
        reason,
        source: Some(Box::new(e)),
    };

    let file = File::open(path).map_err(|e| LoadError::DecodeFailed {
        reason: format!("failed to open {}: {e}", path.display()),
        source: Some(Box::new(e)),
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_failed(format!("unrecognized container in {}", path.display()), e))?;
    let mut format = probed.format;

    let track = format.default_track().ok_or_else(|| LoadError::DecodeFailed {
        reason: format!("{} contains no decodable track", path.display()),
        source: None,
    })?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_failed(format!("unsupported codec in {}", path.display()), e))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut channels = 0usize;
    let mut source_rate = 0u32;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(decode_failed("corrupt stream".to_string(), e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| decode_failed("corrupt packet".to_string(), e))?;
        let spec = *decoded.spec();
        channels = spec.channels.count();
        source_rate = spec.rate;

        let buf = sample_buf
            .get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if samples.is_empty() || channels == 0 || source_rate == 0 {
        return Err(LoadError::Empty);
    }

    normalize(&samples, channels, source_rate)
}

/// Down-mix interleaved samples to mono and resample to the internal rate
fn normalize(
    interleaved: &[f32],
    channels: usize,
    source_rate: u32,
) -> Result<AudioBuffer, LoadError> {
    if interleaved.is_empty() || channels == 0 {
        return Err(LoadError::Empty);
    }

    let mono = downmix(interleaved, channels);
    let resampled = if source_rate != SAMPLE_RATE {
        debug!("Resampling {source_rate} Hz -> {SAMPLE_RATE} Hz");
        resample_linear(&mono, SAMPLE_RATE as f64 / source_rate as f64)
    } else {
        mono
    };

    AudioBuffer::from_samples(resampled)
}

/// Average all channels of each frame into a single mono sample
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    let frames = interleaved.len() / channels;
    let mut mono = Vec::with_capacity(frames);
    for frame in 0..frames {
        let start = frame * channels;
        let sum: f32 = interleaved[start..start + channels].iter().sum();
        mono.push(sum / channels as f32);
    }
    mono
}

/// Linear interpolation resampling
///
/// TODO: Replace with sinc interpolation; downsampling speech from 44.1/48
/// kHz without a lowpass aliases energy above 8 kHz into the band we keep.
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, samples: &[f32], channels: u16, sample_rate: u32) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_unrecognized_extension_rejected_before_decode() {
        // The file does not even exist; classification must fail first.
        let result = load("recording.txt");
        assert!(matches!(result, Err(LoadError::Unsupported { .. })));
    }

    #[test]
    fn test_missing_extension_rejected() {
        let result = load("recording");
        assert!(matches!(result, Err(LoadError::Unsupported { .. })));
    }

    #[test]
    fn test_corrupt_wav_fails_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"not a wav file").unwrap();

        let result = load(&path);
        assert!(matches!(result, Err(LoadError::DecodeFailed { .. })));
    }

    #[test]
    fn test_load_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let tone = AudioBuffer::sine_wave(440.0, 0.5);
        write_wav(&path, tone.samples(), 1, SAMPLE_RATE);

        let first = load(&path).unwrap();
        let second = load(&path).unwrap();
        assert_eq!(first.samples(), second.samples());
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // Constant L = 0.8, R = 0.2 must mix to 0.5
        let interleaved: Vec<f32> = (0..3200).flat_map(|_| [0.8f32, 0.2f32]).collect();
        write_wav(&path, &interleaved, 2, SAMPLE_RATE);

        let buffer = load(&path).unwrap();
        assert_eq!(buffer.len(), 3200);
        assert!(buffer.samples().iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_output_length_independent_of_source_rate() {
        let dir = tempfile::tempdir().unwrap();

        // One second of audio at two different source rates
        for (name, rate) in [("a.wav", 48_000u32), ("b.wav", 32_000u32)] {
            let path = dir.path().join(name);
            let samples: Vec<f32> = (0..rate)
                .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate as f32).sin())
                .collect();
            write_wav(&path, &samples, 1, rate);

            let buffer = load(&path).unwrap();
            // ceil(len * ratio) keeps one second within a sample of 16000
            assert!(
                (buffer.len() as i64 - SAMPLE_RATE as i64).abs() <= 1,
                "{name}: got {} samples",
                buffer.len()
            );
        }
    }

    #[test]
    fn test_downmix_averages_channels() {
        let interleaved = [1.0, 3.0, 5.0, 7.0];
        assert_eq!(downmix(&interleaved, 2), vec![2.0, 6.0]);
    }

    #[test]
    fn test_resample_identity_ratio() {
        let samples = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample_linear(&samples, 1.0), samples.to_vec());
    }

    #[test]
    fn test_resample_doubles_length() {
        let samples = [0.0, 1.0];
        let out = resample_linear(&samples, 2.0);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }
}

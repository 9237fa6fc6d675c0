//! WAV encode/decode for rendered buffers (16-bit mono PCM).

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::RenderError;

fn mono_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Write a mono float buffer to a 16-bit PCM WAV file.
///
/// Samples are clamped to [-1, 1] before quantization.
pub fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) -> Result<(), RenderError> {
    let mut writer = WavWriter::create(path, mono_spec(sample_rate))?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0).round() as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encode a mono float buffer to an in-memory WAV byte buffer.
pub fn encode_wav(samples: &[f64], sample_rate: u32) -> Result<Vec<u8>, RenderError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, mono_spec(sample_rate))?;
        for &s in samples {
            writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0).round() as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Read a WAV file into mono f64 samples plus its sample rate.
///
/// Integer and float formats are accepted; multichannel files are
/// averaged down to mono.
pub fn read_wav(path: &Path) -> Result<(Vec<f64>, u32), RenderError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels as usize;
    if channels <= 1 {
        return Ok((interleaved, spec.sample_rate));
    }
    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect();
    Ok((mono, spec.sample_rate))
}

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::types::AudioData;
use crate::error::{PlayerError, PlayerResult};

/// Decode the first audio track of a file into interleaved 16-bit PCM.
pub fn decode_file(path: &Path) -> PlayerResult<AudioData> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(PlayerError::NoAudioTrack)?
        .clone();

    let sample_rate = checked_sample_rate(track.codec_params.sample_rate)?;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphError::DecodeError(e)) => {
                tracing::warn!("Skipping undecodable packet in {:?}: {}", path, e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count() as u16;

        let mut sample_buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let channels = channels.max(1);
    let num_frames = samples.len() / channels as usize;
    let duration = num_frames as f64 / sample_rate as f64;

    tracing::debug!(
        "Decoded {:?}: {} frames, {} Hz, {} ch, {:.2}s",
        path,
        num_frames,
        sample_rate,
        channels,
        duration
    );

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        duration,
    })
}

/// A track must report a non-zero sample rate for durations to be finite.
fn checked_sample_rate(sample_rate: Option<u32>) -> PlayerResult<u32> {
    match sample_rate {
        Some(0) => Err(PlayerError::Decode("Track reports a sample rate of 0".into())),
        Some(rate) => Ok(rate),
        None => Err(PlayerError::Decode("No sample rate in track".into())),
    }
}

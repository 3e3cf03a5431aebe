use std::path::Path;

use serde::Serialize;

use crate::audio::decoder;
use crate::audio::types::AudioData;
use crate::error::PlayerResult;

/// Normalized peak magnitudes, one per displayed bar.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AmplitudeBars {
    bars: Vec<f32>,
}

impl AmplitudeBars {
    /// Downsample `samples` to at most `target` bars of peak magnitude,
    /// scaled so the loudest bar is 1.0. Silence stays flat at 0.0.
    pub fn compute(samples: &[i16], target: usize) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let factor = samples.len().div_ceil(target.max(1)).max(1);
        let peaks: Vec<u16> = samples
            .chunks(factor)
            .map(|chunk| chunk.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0))
            .collect();

        let global = peaks.iter().copied().max().unwrap_or(0);
        let bars = if global == 0 {
            vec![0.0; peaks.len()]
        } else {
            peaks
                .iter()
                .map(|&p| p as f32 / global as f32)
                .collect()
        };

        Self { bars }
    }

    /// Decode a recording and compute its bars in one pass.
    pub fn extract(path: &Path, target: usize) -> PlayerResult<(Self, AudioData)> {
        let audio = decoder::decode_file(path)?;
        let bars = Self::compute(&audio.samples, target);
        tracing::info!(
            "Extracted {} bars from {:?} ({:.2}s)",
            bars.len(),
            path,
            audio.duration
        );
        Ok((bars, audio))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// True when every bar is zero, including the empty case.
    pub fn is_flat(&self) -> bool {
        self.bars.iter().all(|&b| b == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decoder::tests::write_wav;
    use crate::error::PlayerError;

    #[test]
    fn test_alternating_samples_normalize_to_one() {
        let samples: Vec<i16> = (0..300).map(|i| if i % 2 == 0 { 100 } else { -100 }).collect();
        let bars = AmplitudeBars::compute(&samples, 300);
        assert_eq!(bars.len(), 300);
        assert!(bars.as_slice().iter().all(|&b| b == 1.0));
    }

    #[test]
    fn test_silence_is_flat() {
        let bars = AmplitudeBars::compute(&[0; 1000], 300);
        assert!(!bars.is_empty());
        assert!(bars.is_flat());
        assert!(bars.as_slice().iter().all(|b| !b.is_nan()));
    }

    #[test]
    fn test_empty_buffer() {
        let bars = AmplitudeBars::compute(&[], 300);
        assert!(bars.is_empty());
        assert!(bars.is_flat());
    }

    #[test]
    fn test_bar_count_never_exceeds_target() {
        for n in [1usize, 7, 299, 300, 301, 599, 600, 1234, 44_100] {
            let samples: Vec<i16> = (0..n).map(|i| ((i * 37) % 2000) as i16 - 1000).collect();
            let bars = AmplitudeBars::compute(&samples, 300);
            assert!(bars.len() <= 300.min(n), "n = {n}: {} bars", bars.len());
            assert!(bars.as_slice().iter().all(|&b| (0.0..=1.0).contains(&b)));
        }
    }

    #[test]
    fn test_chunk_peaks_relative_to_loudest() {
        let samples = [10, -20, 5, 40, 0, 0, -80, 1];
        let bars = AmplitudeBars::compute(&samples, 4);
        assert_eq!(bars.as_slice(), &[0.25, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn test_min_sample_does_not_overflow() {
        let bars = AmplitudeBars::compute(&[i16::MIN, i16::MAX, 0, 0], 2);
        assert_eq!(bars.as_slice()[0], 1.0);
        assert_eq!(bars.as_slice()[1], 0.0);
    }

    #[test]
    fn test_zero_target_treated_as_one() {
        let bars = AmplitudeBars::compute(&[1, 2, 3], 0);
        assert_eq!(bars.as_slice(), &[1.0]);
    }

    #[test]
    fn test_extract_from_wav() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = (0..8000).map(|i| ((i as f32 / 40.0).sin() * 12_000.0) as i16).collect();
        let path = write_wav(dir.path(), "lung.wav", 8000, 1, &samples);

        let (bars, audio) = AmplitudeBars::extract(&path, 300).unwrap();
        assert!(bars.len() <= 300);
        assert!(bars.as_slice().iter().any(|&b| b == 1.0));
        assert!((audio.duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = AmplitudeBars::extract(&dir.path().join("missing.wav"), 300).unwrap_err();
        assert!(matches!(err, PlayerError::Io(_)));
    }

    #[test]
    fn test_serializes_as_bar_list() {
        let bars = AmplitudeBars::compute(&[0, 50, 100, 0], 2);
        let json = serde_json::to_string(&bars).unwrap();
        assert_eq!(json, r#"{"bars":[0.5,1.0]}"#);
    }
}

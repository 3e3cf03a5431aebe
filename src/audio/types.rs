use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Decoded recording stored entirely in memory.
#[derive(Clone, Debug)]
pub struct AudioData {
    /// Interleaved signed 16-bit PCM.
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Duration in seconds.
    pub duration: f64,
}

impl AudioData {
    /// Total number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

/// Commands sent from the UI thread to the audio thread.
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Recording plus the load generation echoed back in its events.
    LoadAudio(Arc<AudioData>, u64),
    Play,
    Seek(f64),
    Stop,
}

/// Events sent from the audio thread to the UI thread.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Playback of the given load generation reached the end.
    PlaybackFinished(u64),
    Error(String),
}

/// Elapsed time and duration shared between the audio thread and the
/// position sampler. Both are seconds stored as `f64` bits; a duration of
/// zero means no recording is loaded yet.
#[derive(Debug, Default)]
pub struct PlaybackClock {
    position: AtomicU64,
    duration: AtomicU64,
}

impl PlaybackClock {
    pub fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Acquire))
    }

    pub fn set_position(&self, seconds: f64) {
        self.position.store(seconds.to_bits(), Ordering::Release);
    }

    pub fn duration(&self) -> Option<f64> {
        let duration = f64::from_bits(self.duration.load(Ordering::Acquire));
        (duration > 0.0).then_some(duration)
    }

    pub fn set_duration(&self, seconds: f64) {
        self.duration.store(seconds.to_bits(), Ordering::Release);
    }
}

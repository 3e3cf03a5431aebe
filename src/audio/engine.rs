use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use super::types::{AudioCommand, AudioData, EngineEvent, PlaybackClock};
use crate::error::{PlayerError, PlayerResult};
use crate::scrub::Transport;

struct EngineState {
    audio: Option<Arc<AudioData>>,
    /// Fractional frame position in the source recording.
    cursor: f64,
    playing: bool,
    generation: u64,
    output_sample_rate: u32,
    clock: Arc<PlaybackClock>,
}

impl EngineState {
    fn new(output_sample_rate: u32, clock: Arc<PlaybackClock>) -> Self {
        Self {
            audio: None,
            cursor: 0.0,
            playing: false,
            generation: 0,
            output_sample_rate,
            clock,
        }
    }

    fn publish_position(&self) {
        if let Some(audio) = &self.audio {
            self.clock
                .set_position(self.cursor / audio.sample_rate as f64);
        }
    }

    fn handle_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::LoadAudio(data, generation) => {
                self.generation = generation;
                self.clock.set_duration(data.duration);
                self.clock.set_position(0.0);
                self.audio = Some(data);
                self.cursor = 0.0;
                self.playing = false;
            }
            AudioCommand::Play => {
                if let Some(audio) = &self.audio {
                    if self.cursor >= audio.num_frames() as f64 {
                        self.cursor = 0.0;
                    }
                    self.playing = true;
                    self.publish_position();
                }
            }
            AudioCommand::Seek(time) => {
                if let Some(audio) = &self.audio {
                    let frame = time.max(0.0) * audio.sample_rate as f64;
                    self.cursor = frame.min(audio.num_frames() as f64);
                    self.publish_position();
                }
            }
            AudioCommand::Stop => {
                self.playing = false;
                self.cursor = 0.0;
                self.clock.set_position(0.0);
            }
        }
    }

    /// Fill the output buffer with the next frames of the recording.
    fn fill_buffer(&mut self, output: &mut [f32], channels: u16, event_tx: &Sender<EngineEvent>) {
        let audio = match &self.audio {
            Some(a) if self.playing => a.clone(),
            _ => {
                output.fill(0.0);
                return;
            }
        };

        let audio_channels = audio.channels.max(1) as usize;
        let out_channels = channels.max(1) as usize;
        let total_frames = audio.num_frames();
        let step = audio.sample_rate as f64 / self.output_sample_rate.max(1) as f64;

        for out_frame in output.chunks_mut(out_channels) {
            let frame = self.cursor as usize;
            if !self.playing || frame >= total_frames {
                if self.playing {
                    self.playing = false;
                    self.cursor = total_frames as f64;
                    let _ = event_tx.send(EngineEvent::PlaybackFinished(self.generation));
                }
                out_frame.fill(0.0);
                continue;
            }

            for (c, sample) in out_frame.iter_mut().enumerate() {
                let src_c = c % audio_channels;
                *sample = audio.samples[frame * audio_channels + src_c] as f32 / 32768.0;
            }
            self.cursor += step;
        }

        self.publish_position();
    }
}

/// UI-side handle to the running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    cmd_tx: Sender<AudioCommand>,
    shutdown_tx: Sender<()>,
    clock: Arc<PlaybackClock>,
}

impl EngineHandle {
    pub fn load(&self, audio: Arc<AudioData>, generation: u64) {
        self.clock.set_duration(audio.duration);
        self.clock.set_position(0.0);
        self.send(AudioCommand::LoadAudio(audio, generation));
    }

    /// A handle with no device behind it; commands pile up in the returned
    /// receiver.
    #[cfg(test)]
    pub(crate) fn detached() -> (EngineHandle, Receiver<AudioCommand>) {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, _) = crossbeam_channel::bounded(1);
        (
            EngineHandle {
                cmd_tx,
                shutdown_tx,
                clock: Arc::new(PlaybackClock::default()),
            },
            cmd_rx,
        )
    }

    pub fn stop(&self) {
        self.send(AudioCommand::Stop);
    }

    /// Stop output and release the device stream.
    pub fn shutdown(&self) {
        self.stop();
        let _ = self.shutdown_tx.try_send(());
    }

    fn send(&self, cmd: AudioCommand) {
        if let Err(e) = self.cmd_tx.send(cmd) {
            tracing::warn!("Audio engine is gone, dropping command: {:?}", e.0);
        }
    }
}

impl Transport for EngineHandle {
    fn play(&mut self) {
        self.send(AudioCommand::Play);
    }

    fn seek(&mut self, seconds: f64) {
        let upper = self.clock.duration().unwrap_or(0.0);
        self.clock.set_position(seconds.clamp(0.0, upper));
        self.send(AudioCommand::Seek(seconds));
    }

    fn current_time(&self) -> f64 {
        self.clock.position()
    }

    fn duration(&self) -> Option<f64> {
        self.clock.duration()
    }
}

/// Spawn the audio engine and return its handle and event channel.
pub fn spawn_engine() -> PlayerResult<(EngineHandle, Receiver<EngineEvent>)> {
    let (cmd_tx, cmd_rx) = crossbeam_channel::bounded::<AudioCommand>(64);
    let (event_tx, event_rx) = crossbeam_channel::bounded::<EngineEvent>(256);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| PlayerError::Engine("No audio output device found".into()))?;

    let config = device
        .default_output_config()
        .map_err(|e| PlayerError::Engine(format!("Failed to get output config: {e}")))?;

    let sample_rate = config.sample_rate();
    let channels = config.channels();
    let sample_format = config.sample_format();

    let clock = Arc::new(PlaybackClock::default());
    let mut state = EngineState::new(sample_rate, clock.clone());
    let error_tx = event_tx.clone();

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    while let Ok(cmd) = cmd_rx.try_recv() {
                        state.handle_command(cmd);
                    }
                    state.fill_buffer(data, channels, &event_tx);
                },
                move |err| {
                    tracing::error!("Audio stream error: {err}");
                    let _ = error_tx.try_send(EngineEvent::Error(err.to_string()));
                },
                None,
            )
            .map_err(|e| PlayerError::Engine(format!("Failed to build output stream: {e}")))?,
        _ => {
            return Err(PlayerError::Engine(format!(
                "Unsupported sample format: {sample_format:?}"
            )))
        }
    };

    stream
        .play()
        .map_err(|e| PlayerError::Engine(format!("Failed to start stream: {e}")))?;

    tracing::info!("Audio engine started: {} Hz, {} ch", sample_rate, channels);

    // The stream is not Send on every platform, so it lives and dies on this thread.
    std::thread::Builder::new()
        .name("audio-keepalive".into())
        .spawn(move || {
            let _stream = stream;
            let _ = shutdown_rx.recv();
            tracing::info!("Audio engine stopped");
        })
        .map_err(PlayerError::Io)?;

    Ok((
        EngineHandle {
            cmd_tx,
            shutdown_tx,
            clock,
        },
        event_rx,
    ))
}

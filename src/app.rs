use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use iced::widget::{canvas, center, column, container, text};
use iced::{Element, Length, Subscription, Task, Theme};

use crate::audio::engine::{self, EngineHandle};
use crate::audio::types::{AudioData, EngineEvent};
use crate::config::PlayerConfig;
use crate::scrub::{ScrubController, TransportState};
use crate::ui::controls::{self, ControlMessage};
use crate::ui::waveform::{ScrubMessage, WaveformView};
use crate::waveform::AmplitudeBars;

/// What the player currently has to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordingStatus {
    Empty,
    Loading,
    Ready,
    Unavailable,
}

pub struct App {
    config: PlayerConfig,

    // Audio engine
    engine: Option<EngineHandle>,
    event_rx: Option<Receiver<EngineEvent>>,
    /// Decoded audio waiting for the engine to come up.
    pending_audio: Option<Arc<AudioData>>,
    /// Bumped per load; engine events from older loads are ignored.
    generation: u64,

    // Recording
    status: RecordingStatus,
    filename: Option<String>,
    duration: f64,
    error: Option<String>,

    scrub: ScrubController,
    waveform_view: WaveformView,
}

#[derive(Debug, Clone)]
pub struct LoadedRecording {
    pub filename: String,
    pub bars: AmplitudeBars,
    pub audio: Arc<AudioData>,
}

#[derive(Debug, Clone)]
pub enum Message {
    EngineReady(Result<(EngineHandle, Receiver<EngineEvent>), String>),
    RecordingLoaded(Result<LoadedRecording, String>),
    Control(ControlMessage),
    Scrub(ScrubMessage),
    Tick,
    FileDialogResult(Option<PathBuf>),
}

impl App {
    fn new(config: PlayerConfig) -> Self {
        let waveform_view = WaveformView::new(&config);
        Self {
            config,
            engine: None,
            event_rx: None,
            pending_audio: None,
            generation: 0,
            status: RecordingStatus::Empty,
            filename: None,
            duration: 0.0,
            error: None,
            scrub: ScrubController::new(),
            waveform_view,
        }
    }

    fn can_play(&self) -> bool {
        self.engine.is_some() && self.status == RecordingStatus::Ready
    }

    /// Dismiss the current player: stop sampling, drop any drag, and silence
    /// the engine. Only one recording is ever playing.
    fn teardown_player(&mut self) {
        self.drain_engine_events();
        self.scrub.teardown();
        if let Some(engine) = &self.engine {
            engine.stop();
        }
    }

    fn sync_view(&mut self) {
        self.waveform_view.position = self.scrub.position();
    }

    fn load_recording(&mut self, path: PathBuf) -> Task<Message> {
        self.teardown_player();
        self.generation += 1;
        self.scrub = ScrubController::new();
        self.pending_audio = None;
        self.status = RecordingStatus::Loading;
        self.duration = 0.0;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.filename = Some(filename.clone());

        let bar_count = self.config.bar_count;
        tracing::info!("Loading recording {:?}", path);

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || {
                    AmplitudeBars::extract(&path, bar_count)
                        .map(|(bars, audio)| LoadedRecording {
                            filename,
                            bars,
                            audio: Arc::new(audio),
                        })
                        .map_err(|e| {
                            tracing::error!("Failed to read waveform from {:?}: {}", path, e);
                            e.to_string()
                        })
                })
                .await
                .map_err(|e| e.to_string())
                .and_then(|result| result)
            },
            Message::RecordingLoaded,
        )
    }

    fn drain_engine_events(&mut self) {
        let Some(rx) = &self.event_rx else {
            return;
        };
        while let Ok(event) = rx.try_recv() {
            match event {
                EngineEvent::PlaybackFinished(generation) if generation == self.generation => {
                    tracing::debug!("Playback finished");
                    match &self.engine {
                        Some(engine) => self.scrub.finish(engine),
                        None => self.scrub.teardown(),
                    }
                }
                EngineEvent::PlaybackFinished(generation) => {
                    tracing::debug!("Ignoring finish from load {}", generation);
                }
                EngineEvent::Error(e) => {
                    self.error = Some(e);
                }
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.teardown_player();
        if let Some(engine) = &self.engine {
            engine.shutdown();
        }
    }
}

fn boot(config: PlayerConfig, initial: Option<PathBuf>) -> (App, Task<Message>) {
    let mut app = App::new(config);

    let engine_task = Task::perform(
        async {
            tokio::task::spawn_blocking(|| engine::spawn_engine().map_err(|e| e.to_string()))
                .await
                .map_err(|e| e.to_string())
                .and_then(|result| result)
        },
        Message::EngineReady,
    );

    let load_task = match initial {
        Some(path) => app.load_recording(path),
        None => Task::none(),
    };

    (app, Task::batch([engine_task, load_task]))
}

fn title(app: &App) -> String {
    match &app.filename {
        Some(name) => format!("Stethoscope Player - {name}"),
        None => "Stethoscope Player".to_string(),
    }
}

fn update(app: &mut App, message: Message) -> Task<Message> {
    match message {
        Message::EngineReady(result) => {
            match result {
                Ok((engine, rx)) => {
                    if let Some(audio) = app.pending_audio.take() {
                        engine.load(audio, app.generation);
                    }
                    app.engine = Some(engine);
                    app.event_rx = Some(rx);
                }
                Err(e) => {
                    tracing::error!("Audio engine unavailable: {}", e);
                    app.error = Some(format!("Audio engine error: {e}"));
                }
            }
            Task::none()
        }
        Message::Control(ControlMessage::OpenFile) => Task::perform(
            async {
                let handle = rfd::AsyncFileDialog::new()
                    .add_filter("Recordings", &["wav", "mp3", "flac", "aac", "m4a"])
                    .pick_file()
                    .await;
                handle.map(|h| h.path().to_path_buf())
            },
            Message::FileDialogResult,
        ),
        Message::Control(ControlMessage::Play) => {
            if app.can_play() {
                if let Some(engine) = &mut app.engine {
                    app.scrub.play(engine);
                }
                app.sync_view();
            }
            Task::none()
        }
        Message::FileDialogResult(path) => match path {
            Some(path) => app.load_recording(path),
            None => Task::none(),
        },
        Message::RecordingLoaded(result) => {
            match result {
                Ok(recording) => {
                    if recording.bars.is_flat() {
                        tracing::info!("{} is silent, drawing a flat line", recording.filename);
                    }
                    app.duration = recording.audio.duration;
                    app.filename = Some(recording.filename);
                    app.waveform_view.set_bars(recording.bars);
                    app.status = RecordingStatus::Ready;
                    match &app.engine {
                        Some(engine) => engine.load(recording.audio, app.generation),
                        None => app.pending_audio = Some(recording.audio),
                    }
                }
                Err(_) => {
                    // Already logged where it failed; the view falls back to a notice.
                    app.status = RecordingStatus::Unavailable;
                }
            }
            app.sync_view();
            Task::none()
        }
        Message::Scrub(scrub) => {
            app.drain_engine_events();
            match scrub {
                ScrubMessage::DragMoved { x, width } => app.scrub.drag_to(x, width),
                ScrubMessage::DragEnded { x, width } => match app.engine.as_mut() {
                    Some(engine) => {
                        app.scrub.release(x, width, engine);
                    }
                    None => {
                        app.scrub.drag_to(x, width);
                        app.scrub.teardown();
                    }
                },
            }
            app.sync_view();
            Task::none()
        }
        Message::Tick => {
            app.drain_engine_events();
            if let Some(engine) = &app.engine {
                app.scrub.sample(engine);
            }
            app.sync_view();
            Task::none()
        }
    }
}

fn view(app: &App) -> Element<'_, Message> {
    let header = text(app.filename.as_deref().unwrap_or("No recording")).size(18);

    let waveform_height = Length::Fixed(app.waveform_view.height());
    let waveform: Element<Message> = match app.status {
        RecordingStatus::Ready => {
            let canvas_el: Element<ScrubMessage> = canvas::Canvas::new(&app.waveform_view)
                .width(Length::Fill)
                .height(waveform_height)
                .into();
            canvas_el.map(Message::Scrub)
        }
        RecordingStatus::Loading => center(text("Loading recording...").size(16))
            .width(Length::Fill)
            .height(waveform_height)
            .into(),
        RecordingStatus::Unavailable => center(text("No audio available").size(16))
            .width(Length::Fill)
            .height(waveform_height)
            .into(),
        RecordingStatus::Empty => center(text("Open a recording to begin").size(16))
            .width(Length::Fill)
            .height(waveform_height)
            .into(),
    };

    let controls = controls::view_controls(
        app.scrub.position() * app.duration,
        app.duration,
        app.can_play(),
        app.scrub.state() == TransportState::Playing,
    )
    .map(Message::Control);

    let mut content = column![header, waveform, controls].spacing(16);

    if let Some(err) = &app.error {
        content = content.push(
            container(text(format!("Error: {err}")).color(iced::Color::from_rgb(1.0, 0.3, 0.3)))
                .padding(10),
        );
    }

    container(content)
        .padding(16)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// The position sampler only exists while it is allowed to write; dropping
/// the subscription is what unregisters the timer.
fn subscription(app: &App) -> Subscription<Message> {
    if app.scrub.sampler_active() {
        iced::time::every(app.config.sample_interval()).map(|_| Message::Tick)
    } else {
        Subscription::none()
    }
}

fn theme(_app: &App) -> Theme {
    Theme::Dark
}

pub fn run(config: PlayerConfig, initial: Option<PathBuf>) -> iced::Result {
    iced::application(
        move || boot(config.clone(), initial.clone()),
        update,
        view,
    )
    .title(title)
    .subscription(subscription)
    .theme(theme)
    .window_size((900.0, 260.0))
    .run()
}

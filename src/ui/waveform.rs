use iced::mouse;
use iced::widget::canvas::{self, Action, Cache, Event, Frame, Geometry, Path, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::config::PlayerConfig;
use crate::waveform::AmplitudeBars;

const BAR_COLOR: Color = Color::from_rgb(0.35, 0.62, 0.85);
const INDICATOR_COLOR: Color = Color::from_rgb(0.9, 0.2, 0.2);

/// Canvas state for the waveform bars and the position indicator.
pub struct WaveformView {
    bars_cache: Cache,
    bars: AmplitudeBars,
    /// Elapsed fraction, 0.0 to 1.0.
    pub position: f64,
    bar_width: f32,
    bar_spacing: f32,
    bar_max_height: f32,
    indicator_height: f32,
    indicator_hitbox: f32,
}

/// Drag interactions on the position indicator, in canvas pixels.
#[derive(Debug, Clone, Copy)]
pub enum ScrubMessage {
    DragMoved { x: f32, width: f32 },
    DragEnded { x: f32, width: f32 },
}

impl WaveformView {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            bars_cache: Cache::new(),
            bars: AmplitudeBars::default(),
            position: 0.0,
            bar_width: config.bar_width,
            bar_spacing: config.bar_spacing,
            bar_max_height: config.bar_max_height,
            indicator_height: config.indicator_height,
            indicator_hitbox: config.indicator_hitbox,
        }
    }

    pub fn set_bars(&mut self, bars: AmplitudeBars) {
        if bars.is_empty() {
            tracing::debug!("Recording has no samples");
        }
        self.bars = bars;
        self.position = 0.0;
        self.bars_cache.clear();
    }

    pub fn height(&self) -> f32 {
        self.indicator_height.max(self.bar_max_height)
    }

    /// Horizontal pitch and drawn width of each bar when the bars are
    /// stretched across `width` pixels, keeping the configured bar/gap ratio.
    fn bar_layout(&self, width: f32) -> (f32, f32) {
        let count = self.bars.len().max(1) as f32;
        let pitch = width / count;
        let ratio = self.bar_width / (self.bar_width + self.bar_spacing).max(f32::EPSILON);
        (pitch, (pitch * ratio).max(1.0))
    }

    fn indicator_x(&self, width: f32) -> f32 {
        (self.position * width as f64) as f32
    }

    fn hits_indicator(&self, x: f32, width: f32) -> bool {
        (x - self.indicator_x(width)).abs() <= self.indicator_hitbox / 2.0
    }
}

impl canvas::Program<ScrubMessage> for WaveformView {
    /// Last x of the drag in progress, `None` when not dragging.
    type State = Option<f32>;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let width = bounds.width;
        let height = bounds.height;
        let center_y = height / 2.0;

        let bars = self.bars_cache.draw(renderer, bounds.size(), |frame| {
            frame.fill_rectangle(
                Point::ORIGIN,
                bounds.size(),
                Color::from_rgba(0.5, 0.5, 0.5, 0.1),
            );

            let (pitch, bar_width) = self.bar_layout(width);
            for (i, &amp) in self.bars.as_slice().iter().enumerate() {
                let bar_height = (amp * self.bar_max_height).max(1.0);
                frame.fill_rectangle(
                    Point::new(i as f32 * pitch, center_y - bar_height / 2.0),
                    Size::new(bar_width, bar_height),
                    BAR_COLOR,
                );
            }
        });

        let indicator = {
            let mut frame = Frame::new(renderer, bounds.size());
            let x = self.indicator_x(width);
            let top = center_y - self.indicator_height / 2.0;
            let line = Path::line(
                Point::new(x, top),
                Point::new(x, top + self.indicator_height),
            );
            frame.stroke(
                &line,
                Stroke::default()
                    .with_color(INDICATOR_COLOR)
                    .with_width(2.0),
            );
            frame.into_geometry()
        };

        vec![bars, indicator]
    }

    fn update(
        &self,
        drag: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Action<ScrubMessage>> {
        let width = bounds.width;

        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let pos = cursor.position_in(bounds)?;
                if !self.hits_indicator(pos.x, width) {
                    return None;
                }
                *drag = Some(pos.x);
                Some(Action::publish(ScrubMessage::DragMoved { x: pos.x, width }).and_capture())
            }
            Event::Mouse(mouse::Event::CursorMoved { .. }) if drag.is_some() => {
                let x = cursor.position()?.x - bounds.x;
                *drag = Some(x);
                Some(Action::publish(ScrubMessage::DragMoved { x, width }).and_capture())
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let last = drag.take()?;
                let x = release_x(last, cursor, bounds);
                Some(Action::publish(ScrubMessage::DragEnded { x, width }).and_capture())
            }
            _ => None,
        }
    }

    fn mouse_interaction(
        &self,
        drag: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if drag.is_some() {
            return mouse::Interaction::Grabbing;
        }
        match cursor.position_in(bounds) {
            Some(pos) if self.hits_indicator(pos.x, bounds.width) => mouse::Interaction::Grab,
            _ => mouse::Interaction::default(),
        }
    }
}

/// Where a drag ends: the cursor if iced still reports it, otherwise the
/// last position seen while dragging.
fn release_x(last: f32, cursor: mouse::Cursor, bounds: Rectangle) -> f32 {
    cursor.position().map_or(last, |p| p.x - bounds.x)
}

use iced::widget::{button, container, text, Row};
use iced::{Alignment, Element, Length};

#[derive(Debug, Clone)]
pub enum ControlMessage {
    Play,
    OpenFile,
}

/// Format seconds as M:SS.
pub fn format_time(seconds: f64) -> String {
    let total_secs = seconds.max(0.0) as u64;
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{mins}:{secs:02}")
}

/// Build the transport row: open, elapsed/total, play.
pub fn view_controls<'a>(
    elapsed: f64,
    duration: f64,
    can_play: bool,
    playing: bool,
) -> Element<'a, ControlMessage> {
    let open_btn = button(text("Open Recording")).on_press(ControlMessage::OpenFile);

    let label = if playing { "Playing" } else { "Play" };
    let mut play_btn = button(text(label).size(16)).padding(8);
    if can_play {
        play_btn = play_btn.on_press(ControlMessage::Play);
    }

    let time_display = text(format!(
        "{} / {}",
        format_time(elapsed),
        format_time(duration)
    ))
    .size(16);

    let controls_row = Row::new()
        .spacing(10)
        .align_y(Alignment::Center)
        .push(open_btn)
        .push(container(time_display).width(Length::Fill))
        .push(play_btn);

    container(controls_row).padding(10).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9.99), "0:09");
        assert_eq!(format_time(75.0), "1:15");
        assert_eq!(format_time(-3.0), "0:00");
    }
}

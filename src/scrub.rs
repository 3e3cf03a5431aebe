//! Playback position and drag-to-seek state.
//!
//! The position fraction has two writers: the periodic sampler while audio
//! plays, and the user while the indicator is dragged. [`PositionOwner`]
//! decides which one may write at any moment.

/// Something that plays a recording and reports where it is.
pub trait Transport {
    fn play(&mut self);
    fn seek(&mut self, seconds: f64);
    /// Elapsed playback time in seconds.
    fn current_time(&self) -> f64;
    /// Total duration in seconds, if known yet.
    fn duration(&self) -> Option<f64>;
}

/// Which writer currently owns the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOwner {
    Timer,
    UserInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Playing,
}

#[derive(Debug, Clone)]
pub struct ScrubController {
    state: TransportState,
    owner: PositionOwner,
    /// Elapsed fraction in [0, 1].
    position: f64,
}

impl Default for ScrubController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrubController {
    pub fn new() -> Self {
        Self {
            state: TransportState::Idle,
            owner: PositionOwner::Timer,
            position: 0.0,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.owner == PositionOwner::UserInput
    }

    /// Whether the periodic sampler should be registered right now.
    pub fn sampler_active(&self) -> bool {
        self.state == TransportState::Playing && self.owner == PositionOwner::Timer
    }

    pub fn play<T: Transport>(&mut self, transport: &mut T) {
        if self.position >= 1.0 && !self.is_dragging() {
            self.position = 0.0;
        }
        transport.play();
        self.state = TransportState::Playing;
    }

    /// Periodic sampler tick. Returns whether the position was written.
    pub fn sample<T: Transport>(&mut self, transport: &T) -> bool {
        if !self.sampler_active() {
            return false;
        }
        let duration = effective_duration(transport.duration());
        self.position = (transport.current_time() / duration).clamp(0.0, 1.0);
        true
    }

    /// Move the indicator to pixel `x` of a track `width` pixels wide.
    pub fn drag_to(&mut self, x: f32, width: f32) {
        self.owner = PositionOwner::UserInput;
        self.position = fraction_for(x, width);
    }

    /// End a drag at pixel `x`, seek there, and hand the position back to
    /// the sampler. Returns the seek target in seconds.
    pub fn release<T: Transport>(&mut self, x: f32, width: f32, transport: &mut T) -> f64 {
        self.position = fraction_for(x, width);
        let target = self.position * effective_duration(transport.duration());
        transport.seek(target);
        self.owner = PositionOwner::Timer;
        tracing::debug!("Seek to {:.3}s ({:.3})", target, self.position);
        target
    }

    /// The transport stopped on its own. The position is read back from the
    /// transport, so a seek that landed after the stop is kept.
    pub fn finish<T: Transport>(&mut self, transport: &T) {
        self.state = TransportState::Idle;
        if !self.is_dragging() {
            let duration = effective_duration(transport.duration());
            self.position = (transport.current_time() / duration).clamp(0.0, 1.0);
        }
    }

    /// The player view is going away; stop sampling and drop any drag.
    pub fn teardown(&mut self) {
        self.state = TransportState::Idle;
        self.owner = PositionOwner::Timer;
    }
}

/// Duration used for position math. Unknown or degenerate durations count
/// as one second so the division stays finite.
pub fn effective_duration(duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => 1.0,
    }
}

/// `clamp(x, 0, width) / width`, or 0 for an empty track or a non-finite x.
pub fn fraction_for(x: f32, width: f32) -> f64 {
    if !x.is_finite() || width.is_nan() || width <= 0.0 {
        return 0.0;
    }
    let width = width as f64;
    (x as f64).clamp(0.0, width) / width
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Transport with a manually advanced clock that records every seek.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        pub(crate) time: f64,
        pub(crate) duration: Option<f64>,
        pub(crate) plays: usize,
        pub(crate) seeks: Vec<f64>,
    }

    impl Transport for MockTransport {
        fn play(&mut self) {
            self.plays += 1;
        }

        fn seek(&mut self, seconds: f64) {
            self.seeks.push(seconds);
            self.time = seconds;
        }

        fn current_time(&self) -> f64 {
            self.time
        }

        fn duration(&self) -> Option<f64> {
            self.duration
        }
    }

    fn transport(duration: f64) -> MockTransport {
        MockTransport {
            duration: Some(duration),
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_idle_at_zero() {
        let scrub = ScrubController::new();
        assert_eq!(scrub.state(), TransportState::Idle);
        assert!(!scrub.is_dragging());
        assert_eq!(scrub.position(), 0.0);
        assert!(!scrub.sampler_active());
    }

    #[test]
    fn test_sampler_ignored_while_idle() {
        let mut scrub = ScrubController::new();
        let mut t = transport(10.0);
        t.time = 5.0;
        assert!(!scrub.sample(&t));
        assert_eq!(scrub.position(), 0.0);
    }

    #[test]
    fn test_polling_is_monotonic_and_bounded() {
        let mut scrub = ScrubController::new();
        let mut t = transport(8.0);
        scrub.play(&mut t);
        assert_eq!(t.plays, 1);

        let mut last = 0.0;
        for tick in 0..=200 {
            t.time = tick as f64 * 0.05;
            assert!(scrub.sample(&t));
            let p = scrub.position();
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= last);
            last = p;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_unknown_duration_uses_one_second() {
        let mut scrub = ScrubController::new();
        let mut t = MockTransport::default();
        scrub.play(&mut t);

        t.time = 0.25;
        scrub.sample(&t);
        assert_eq!(scrub.position(), 0.25);

        t.time = 3.0;
        scrub.sample(&t);
        assert_eq!(scrub.position(), 1.0);
    }

    #[test]
    fn test_drag_sets_exact_fraction() {
        let mut scrub = ScrubController::new();
        scrub.drag_to(75.0, 300.0);
        assert_eq!(scrub.position(), 75.0 / 300.0);
        assert!(scrub.is_dragging());

        scrub.drag_to(-40.0, 300.0);
        assert_eq!(scrub.position(), 0.0);

        scrub.drag_to(512.0, 300.0);
        assert_eq!(scrub.position(), 1.0);
    }

    #[test]
    fn test_drag_while_playing_matches_idle() {
        let mut idle = ScrubController::new();
        let mut playing = ScrubController::new();
        let mut t = transport(4.0);
        playing.play(&mut t);
        t.time = 3.0;
        playing.sample(&t);

        idle.drag_to(123.0, 250.0);
        playing.drag_to(123.0, 250.0);
        assert_eq!(idle.position(), playing.position());
    }

    #[test]
    fn test_drag_suppresses_sampler() {
        let mut scrub = ScrubController::new();
        let mut t = transport(10.0);
        scrub.play(&mut t);

        scrub.drag_to(30.0, 100.0);
        assert!(!scrub.sampler_active());
        t.time = 9.0;
        assert!(!scrub.sample(&t));
        assert_eq!(scrub.position(), 0.3);
    }

    #[test]
    fn test_release_seeks_once_and_resumes_sampling() {
        let mut scrub = ScrubController::new();
        let mut t = transport(20.0);
        scrub.play(&mut t);
        scrub.drag_to(10.0, 200.0);
        scrub.drag_to(50.0, 200.0);

        let target = scrub.release(50.0, 200.0, &mut t);
        assert_eq!(t.seeks, vec![5.0]);
        assert_eq!(target, 5.0);
        assert!(!scrub.is_dragging());
        assert!(scrub.sampler_active());

        t.time = 6.0;
        assert!(scrub.sample(&t));
        assert_eq!(scrub.position(), 0.3);
    }

    #[test]
    fn test_release_while_idle_still_seeks() {
        let mut scrub = ScrubController::new();
        let mut t = transport(8.0);
        scrub.drag_to(100.0, 400.0);
        scrub.release(100.0, 400.0, &mut t);

        assert_eq!(t.seeks, vec![2.0]);
        assert!(!scrub.sampler_active());
        assert_eq!(scrub.position(), 0.25);
    }

    #[test]
    fn test_finish_pins_position_and_replay_rewinds() {
        let mut scrub = ScrubController::new();
        let mut t = transport(2.0);
        scrub.play(&mut t);
        t.time = 2.0;
        scrub.finish(&t);
        assert_eq!(scrub.state(), TransportState::Idle);
        assert_eq!(scrub.position(), 1.0);

        scrub.play(&mut t);
        assert_eq!(scrub.position(), 0.0);
        assert_eq!(t.plays, 2);
    }

    #[test]
    fn test_teardown_unregisters_sampler() {
        let mut scrub = ScrubController::new();
        let mut t = transport(2.0);
        scrub.play(&mut t);
        scrub.drag_to(1.0, 2.0);
        scrub.teardown();

        assert!(!scrub.sampler_active());
        assert!(!scrub.is_dragging());
    }

    #[test]
    fn test_finish_after_seek_keeps_seek_target() {
        let mut scrub = ScrubController::new();
        let mut t = transport(10.0);
        scrub.play(&mut t);
        scrub.drag_to(90.0, 100.0);
        scrub.release(30.0, 100.0, &mut t);

        scrub.finish(&t);
        assert_eq!(scrub.state(), TransportState::Idle);
        assert_eq!(scrub.position(), 0.3);
    }

    #[test]
    fn test_finish_while_dragging_leaves_drag_alone() {
        let mut scrub = ScrubController::new();
        let mut t = transport(10.0);
        scrub.play(&mut t);
        scrub.drag_to(90.0, 100.0);
        t.time = 10.0;

        scrub.finish(&t);
        assert!(scrub.is_dragging());
        assert_eq!(scrub.position(), 0.9);
    }

    #[test]
    fn test_fraction_for_non_finite_x() {
        assert_eq!(fraction_for(f32::NAN, 300.0), 0.0);
        assert_eq!(fraction_for(f32::INFINITY, 300.0), 0.0);
        assert_eq!(fraction_for(f32::NEG_INFINITY, 300.0), 0.0);

        let mut scrub = ScrubController::new();
        scrub.drag_to(f32::NAN, 300.0);
        assert_eq!(scrub.position(), 0.0);
    }

    #[test]
    fn test_fraction_for_empty_track() {
        assert_eq!(fraction_for(10.0, 0.0), 0.0);
        assert_eq!(fraction_for(10.0, f32::NAN), 0.0);
    }

    #[test]
    fn test_effective_duration_guards() {
        assert_eq!(effective_duration(None), 1.0);
        assert_eq!(effective_duration(Some(0.0)), 1.0);
        assert_eq!(effective_duration(Some(f64::NAN)), 1.0);
        assert_eq!(effective_duration(Some(f64::INFINITY)), 1.0);
        assert_eq!(effective_duration(Some(12.0)), 12.0);
    }
}

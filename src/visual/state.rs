use std::time::Instant;

use crate::audio::{extract_bands, ControlSignals, ResponseCurve};

use super::mode::ModeController;

/// Stalled frames (debugger pause, window drag) are clamped so the time
/// accumulator cannot jump.
const MAX_FRAME_DELTA: f32 = 0.1;

/// All mutable per-frame state, owned by the tick-loop driver and passed
/// into the render stage by reference. Nothing here is global.
pub struct VisualState {
    pub time: f32,
    pub signals: ControlSignals,
    pub modes: ModeController,
    curve: ResponseCurve,
}

impl VisualState {
    pub fn new(modes: ModeController) -> Self {
        Self {
            time: 0.0,
            signals: ControlSignals::default(),
            modes,
            curve: ResponseCurve::default(),
        }
    }

    /// One control-plane step: advance time, run the audio-to-parameter
    /// pipeline on the latest spectrum frame, update mode blending.
    pub fn tick(&mut self, dt: f32, frame: &[u8]) {
        self.time += dt;
        self.signals = self.curve.shape(extract_bands(frame));
        self.modes.update(self.time);
    }
}

/// Measures real elapsed time between host refresh callbacks.
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Seconds since the previous tick, clamped to `MAX_FRAME_DELTA`.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt.min(MAX_FRAME_DELTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::mode::{ModePicker, VisualMode, SMOOTHING_FACTOR};

    /// Always picks the same mode; keeps long-running pipeline tests
    /// deterministic past the switch interval.
    struct FixedPicker(VisualMode);

    impl ModePicker for FixedPicker {
        fn pick(&mut self, _modes: &[VisualMode]) -> VisualMode {
            self.0
        }
    }

    fn state_with(mode_pick: VisualMode) -> VisualState {
        VisualState::new(ModeController::new(Box::new(FixedPicker(mode_pick))))
    }

    #[test]
    fn silent_input_keeps_signals_at_zero_while_modes_still_move() {
        let mut state = state_with(VisualMode::Trail);
        let silence = vec![0u8; 1024];

        state.modes.force_mode(VisualMode::Particles);
        let initial_trail = state.modes.weights().trail;

        for _ in 0..60 {
            state.tick(0.016, &silence);
            assert_eq!(state.signals, ControlSignals::default());
        }

        // Visual motion is decoupled from audio amplitude: the trail weight
        // converged toward the Particles target despite total silence.
        let expected_cap = (1.0 - SMOOTHING_FACTOR).powi(60) * initial_trail;
        assert!(state.modes.weights().trail <= expected_cap + 1e-5);
    }

    #[test]
    fn full_scale_input_saturates_every_signal() {
        let mut state = state_with(VisualMode::Hybrid);
        let full_scale = vec![255u8; 1024];

        state.tick(0.016, &full_scale);

        assert_eq!(state.signals.bass, 1.0);
        assert_eq!(state.signals.mid, 1.0);
        assert_eq!(state.signals.treble, 1.0);
    }

    #[test]
    fn time_accumulates_across_ticks() {
        let mut state = state_with(VisualMode::Hybrid);
        let frame = vec![0u8; 64];

        for _ in 0..10 {
            state.tick(0.25, &frame);
        }
        assert!((state.time - 2.5).abs() < 1e-5);
    }

    #[test]
    fn frame_clock_clamps_stalls() {
        let mut clock = FrameClock::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let dt = clock.tick();

        assert!(dt > 0.0);
        assert!(dt <= MAX_FRAME_DELTA);
    }
}

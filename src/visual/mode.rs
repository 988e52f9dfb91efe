use log::debug;
use rand::Rng;

/// Seconds between automatic mode switches.
pub const SWITCH_INTERVAL: f32 = 15.0;
/// Per-tick exponential smoothing rate for blend weights.
pub const SMOOTHING_FACTOR: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualMode {
    Trail,
    Particles,
    Hybrid,
}

impl VisualMode {
    pub const ALL: [VisualMode; 3] = [VisualMode::Trail, VisualMode::Particles, VisualMode::Hybrid];

    /// Target blend weights for each mode: (trail, particle).
    pub fn target_weights(self) -> BlendWeights {
        match self {
            VisualMode::Trail => BlendWeights { trail: 1.0, particle: 0.0 },
            VisualMode::Particles => BlendWeights { trail: 0.0, particle: 1.0 },
            VisualMode::Hybrid => BlendWeights { trail: 1.0, particle: 1.0 },
        }
    }
}

/// Smoothed layer contributions. Each weight eases toward its mode target
/// every tick and never overshoots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub trail: f32,
    pub particle: f32,
}

/// Source of the next mode at a timed switch. Injectable so tests can
/// script an exact sequence.
pub trait ModePicker {
    fn pick(&mut self, modes: &[VisualMode]) -> VisualMode;
}

/// Uniform choice over all modes, including re-selecting the current one.
pub struct UniformPicker {
    rng: rand::rngs::ThreadRng,
}

impl UniformPicker {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl ModePicker for UniformPicker {
    fn pick(&mut self, modes: &[VisualMode]) -> VisualMode {
        modes[self.rng.random_range(0..modes.len())]
    }
}

/// Timed state machine over the visual modes.
///
/// Automatic transitions happen only once `SWITCH_INTERVAL` has elapsed since
/// the last switch; the blend weights are smoothed toward the current targets
/// on every tick regardless, so a mode change never pops visually.
pub struct ModeController {
    mode: VisualMode,
    target: BlendWeights,
    weights: BlendWeights,
    last_switch: f32,
    picker: Box<dyn ModePicker>,
}

impl ModeController {
    pub fn new(picker: Box<dyn ModePicker>) -> Self {
        let mode = VisualMode::Hybrid;
        Self {
            mode,
            target: mode.target_weights(),
            weights: mode.target_weights(),
            last_switch: 0.0,
            picker,
        }
    }

    /// One tick: switch if the interval elapsed, then ease the weights.
    pub fn update(&mut self, now: f32) {
        if now - self.last_switch > SWITCH_INTERVAL {
            let next = self.picker.pick(&VisualMode::ALL);
            self.apply_mode(next);
            self.last_switch = now;
        }

        self.weights.trail += (self.target.trail - self.weights.trail) * SMOOTHING_FACTOR;
        self.weights.particle += (self.target.particle - self.weights.particle) * SMOOTHING_FACTOR;
    }

    /// Deterministic external override. Bypasses the switch timer without
    /// resetting it, so the next automatic switch stays on schedule.
    pub fn force_mode(&mut self, mode: VisualMode) {
        self.apply_mode(mode);
    }

    fn apply_mode(&mut self, mode: VisualMode) {
        if mode != self.mode {
            debug!("visual mode -> {:?}", mode);
        }
        self.mode = mode;
        self.target = mode.target_weights();
    }

    pub fn mode(&self) -> VisualMode {
        self.mode
    }

    pub fn weights(&self) -> BlendWeights {
        self.weights
    }

    pub fn targets(&self) -> BlendWeights {
        self.target
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(Box::new(UniformPicker::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Returns a preset sequence; panics if asked for more picks than
    /// scripted, which doubles as an assertion that no unexpected switch
    /// happened.
    struct ScriptedPicker {
        sequence: VecDeque<VisualMode>,
    }

    impl ScriptedPicker {
        fn new(sequence: &[VisualMode]) -> Box<Self> {
            Box::new(Self { sequence: sequence.iter().copied().collect() })
        }
    }

    impl ModePicker for ScriptedPicker {
        fn pick(&mut self, _modes: &[VisualMode]) -> VisualMode {
            self.sequence.pop_front().expect("unexpected mode switch")
        }
    }

    #[test]
    fn starts_in_hybrid_with_hybrid_weights() {
        let controller = ModeController::new(ScriptedPicker::new(&[]));
        assert_eq!(controller.mode(), VisualMode::Hybrid);
        assert_eq!(controller.weights(), VisualMode::Hybrid.target_weights());
    }

    #[test]
    fn switches_only_after_interval_elapses() {
        let mut controller = ModeController::new(ScriptedPicker::new(&[VisualMode::Trail]));

        // At and below the interval nothing happens (picker would panic).
        controller.update(10.0);
        controller.update(SWITCH_INTERVAL);
        assert_eq!(controller.mode(), VisualMode::Hybrid);

        controller.update(SWITCH_INTERVAL + 0.01);
        assert_eq!(controller.mode(), VisualMode::Trail);

        // Timer was reset: no further switch until another full interval.
        controller.update(SWITCH_INTERVAL + 5.0);
        assert_eq!(controller.mode(), VisualMode::Trail);
    }

    #[test]
    fn self_transition_resets_the_timer() {
        let mut controller =
            ModeController::new(ScriptedPicker::new(&[VisualMode::Hybrid, VisualMode::Particles]));

        controller.update(SWITCH_INTERVAL + 1.0);
        assert_eq!(controller.mode(), VisualMode::Hybrid);

        // The re-selection above still counts as a switch.
        controller.update(2.0 * SWITCH_INTERVAL + 1.0);
        assert_eq!(controller.mode(), VisualMode::Hybrid);
        controller.update(2.0 * SWITCH_INTERVAL + 1.1);
        assert_eq!(controller.mode(), VisualMode::Particles);
    }

    #[test]
    fn force_mode_does_not_reset_the_timer() {
        let mut controller = ModeController::new(ScriptedPicker::new(&[VisualMode::Hybrid]));

        controller.update(14.0);
        controller.force_mode(VisualMode::Particles);
        assert_eq!(controller.mode(), VisualMode::Particles);
        assert_eq!(controller.targets(), VisualMode::Particles.target_weights());

        // The automatic switch still fires on its existing schedule.
        controller.update(SWITCH_INTERVAL + 0.5);
        assert_eq!(controller.mode(), VisualMode::Hybrid);
    }

    #[test]
    fn weights_converge_exponentially_without_overshoot() {
        let mut controller = ModeController::new(ScriptedPicker::new(&[]));
        controller.force_mode(VisualMode::Trail);

        // Particle weight decays from 1.0 toward 0.0.
        let initial_error = controller.weights().particle;
        let ticks = 40;
        for _ in 0..ticks {
            controller.update(1.0);
            assert!(controller.weights().particle >= 0.0);
        }

        let bound = (1.0 - SMOOTHING_FACTOR).powi(ticks) * initial_error;
        assert!(controller.weights().particle <= bound + 1e-5);
        assert!(controller.weights().particle > 0.0, "convergence is asymptotic");
    }

    #[test]
    fn switched_state_is_always_a_known_mode() {
        let mut controller = ModeController::default();
        for i in 1..=10 {
            controller.update(i as f32 * (SWITCH_INTERVAL + 1.0));
            assert!(VisualMode::ALL.contains(&controller.mode()));
        }
    }
}

use super::bands::BandLevels;

/// Shaped, perceptually emphasized control values in [0,1]. These are the
/// only audio-derived values the visual layers consume.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlSignals {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

/// Gain and power-law exponent for one band.
#[derive(Debug, Clone, Copy)]
pub struct BandShaping {
    pub gain: f32,
    pub exponent: f32,
}

impl BandShaping {
    fn apply(self, level: f32) -> f32 {
        (level * self.gain).powf(self.exponent).clamp(0.0, 1.0)
    }
}

/// Per-band response shaping: raw averaged spectral energy is perceptually
/// flat and rarely saturates, so each band is pre-amplified before a
/// power-law exponent expands the upper range and compresses near-silence.
/// Each gain/exponent pair is an independent tunable.
#[derive(Debug, Clone)]
pub struct ResponseCurve {
    pub bass: BandShaping,
    pub mid: BandShaping,
    pub treble: BandShaping,
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self {
            bass: BandShaping { gain: 2.5, exponent: 1.5 },
            mid: BandShaping { gain: 2.0, exponent: 1.3 },
            treble: BandShaping { gain: 2.5, exponent: 1.2 },
        }
    }
}

impl ResponseCurve {
    /// Map band averages to control signals. Pure, no hidden state.
    pub fn shape(&self, bands: BandLevels) -> ControlSignals {
        ControlSignals {
            bass: self.bass.apply(bands.low),
            mid: self.mid.apply(bands.mid),
            treble: self.treble.apply(bands.high),
        }
    }
}

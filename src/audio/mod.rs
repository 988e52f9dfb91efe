pub mod bands;
pub mod capture;
pub mod response;

pub use bands::{average_level, extract_bands, BandLevels};
pub use capture::{AudioCaptureError, SpectrumSource, ANALYSIS_WINDOW, SPECTRUM_BINS};
pub use response::{ControlSignals, ResponseCurve};

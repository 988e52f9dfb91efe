use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;
use thiserror::Error;

/// Samples per analysis window.
pub const ANALYSIS_WINDOW: usize = 2048;
/// Bins in a spectrum frame: half the analysis window.
pub const SPECTRUM_BINS: usize = ANALYSIS_WINDOW / 2;

/// Per-bin temporal smoothing applied before the decibel conversion.
const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
/// Decibel range mapped onto the 0-255 byte scale.
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

#[derive(Debug, Error)]
pub enum AudioCaptureError {
    #[error("audio input permission denied: {0}")]
    PermissionDenied(String),
    #[error("audio input device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Live microphone spectrum source.
///
/// The cpal callback mixes incoming buffers to mono and ships them over a
/// channel; `read_frame` drains whatever has arrived and re-analyzes the most
/// recent window. Reads never block: if the audio backend has produced
/// nothing new since the last tick, the previous frame is returned again.
pub struct SpectrumSource {
    #[allow(dead_code)]
    stream: Stream,
    sample_receiver: Receiver<Vec<f32>>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    ring: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    frame: Vec<u8>,
}

impl SpectrumSource {
    /// Acquire the default input device and start streaming.
    ///
    /// Acquisition failures are fatal to startup: the caller must not begin
    /// the tick loop without a live stream, and no retry is attempted here.
    pub fn acquire() -> Result<Self, AudioCaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioCaptureError::DeviceUnavailable("no input device".to_string()))?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioCaptureError::DeviceUnavailable(e.to_string()))?;

        info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );
        info!("Audio config: {:?}", config);

        let (sample_sender, sample_receiver) = crossbeam_channel::unbounded();
        let stream = Self::create_input_stream(&device, &config.into(), sample_sender)?;

        stream.play().map_err(|e| match e {
            cpal::PlayStreamError::BackendSpecific { err } => {
                AudioCaptureError::PermissionDenied(err.description)
            }
            other => AudioCaptureError::DeviceUnavailable(other.to_string()),
        })?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(ANALYSIS_WINDOW);

        Ok(Self {
            stream,
            sample_receiver,
            fft,
            window: hann_window(ANALYSIS_WINDOW),
            ring: Vec::with_capacity(ANALYSIS_WINDOW * 2),
            scratch: vec![Complex::new(0.0, 0.0); ANALYSIS_WINDOW],
            smoothed: vec![0.0; SPECTRUM_BINS],
            frame: vec![0; SPECTRUM_BINS],
        })
    }

    fn create_input_stream(
        device: &Device,
        config: &StreamConfig,
        sender: Sender<Vec<f32>>,
    ) -> Result<Stream, AudioCaptureError> {
        let channels = config.channels as usize;

        info!(
            "Creating input stream with {} channels at {} Hz",
            channels, config.sample_rate.0
        );

        device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mono_data: Vec<f32> = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };

                    if sender.send(mono_data).is_err() {
                        warn!("Failed to send audio data");
                    }
                },
                |err| {
                    warn!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::BackendSpecific { err } => {
                    AudioCaptureError::PermissionDenied(err.description)
                }
                other => AudioCaptureError::DeviceUnavailable(other.to_string()),
            })
    }

    /// Non-blocking read of the most recent spectrum frame, values 0-255.
    ///
    /// If the tick loop outpaces the audio backend this returns the same
    /// data as the previous call; that is a snapshot, not an error.
    pub fn read_frame(&mut self) -> &[u8] {
        while let Ok(chunk) = self.sample_receiver.try_recv() {
            self.ring.extend_from_slice(&chunk);
        }

        // Keep only the most recent window.
        if self.ring.len() > ANALYSIS_WINDOW {
            let excess = self.ring.len() - ANALYSIS_WINDOW;
            self.ring.drain(..excess);
        }

        if self.ring.len() == ANALYSIS_WINDOW {
            self.refresh_spectrum();
        }

        &self.frame
    }

    fn refresh_spectrum(&mut self) {
        for (i, &sample) in self.ring.iter().enumerate() {
            self.scratch[i] = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        for i in 0..SPECTRUM_BINS {
            let magnitude = self.scratch[i].norm() * 2.0 / ANALYSIS_WINDOW as f32;
            self.smoothed[i] = SMOOTHING_TIME_CONSTANT * self.smoothed[i]
                + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;
            self.frame[i] = magnitude_to_byte(self.smoothed[i]);
        }
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Map a linear magnitude onto the byte scale: decibels in
/// [MIN_DECIBELS, MAX_DECIBELS] span 0-255, anything outside clamps.
fn magnitude_to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }

    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    (scaled.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_window_shape() {
        let window = hann_window(ANALYSIS_WINDOW);

        assert!((window[0] - 0.0).abs() < 0.01);
        assert!((window[ANALYSIS_WINDOW - 1] - 0.0).abs() < 0.01);
        assert!((window[ANALYSIS_WINDOW / 2] - 1.0).abs() < 0.01);
    }

    #[test]
    fn byte_conversion_clamps_at_the_rails() {
        // Silence and anything under the -100 dB floor pin to 0.
        assert_eq!(magnitude_to_byte(0.0), 0);
        assert_eq!(magnitude_to_byte(1e-6), 0);

        // Anything at or above the -30 dB ceiling pins to 255.
        assert_eq!(magnitude_to_byte(1.0), 255);
        assert_eq!(magnitude_to_byte(0.1), 255);
    }

    #[test]
    fn byte_conversion_is_monotone_in_between() {
        // -65 dB sits at the midpoint of the mapped range.
        let mid = magnitude_to_byte(10f32.powf(-65.0 / 20.0));
        assert!((126..=128).contains(&mid));

        let quiet = magnitude_to_byte(10f32.powf(-90.0 / 20.0));
        let loud = magnitude_to_byte(10f32.powf(-40.0 / 20.0));
        assert!(quiet < mid);
        assert!(mid < loud);
    }
}

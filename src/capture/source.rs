//! Frame source abstraction.
//!
//! Real capture devices live outside this crate. The trait lets a caller
//! plug one in, and [`SyntheticSource`] provides a deterministic panning
//! texture with known ground-truth motion for tests and demos.

use super::{Frame, SourceConfig};
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use thiserror::Error;

/// Errors that can occur while pulling frames from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Source configuration was rejected.
    #[error("failed to configure source: {0}")]
    ConfigFailed(String),
    /// A frame could not be produced.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// Frames were requested before the source was set up.
    #[error("source not initialized")]
    NotInitialized,
}

/// Trait for anything that yields consecutive grayscale frames.
///
/// Every frame from one source shares the configured dimensions.
pub trait FrameSource {
    /// Opens and initializes the source with the given configuration.
    fn open(&mut self, config: &SourceConfig) -> Result<(), SourceError>;

    /// Returns the next frame in sequence.
    fn next_frame(&mut self) -> Result<Frame, SourceError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases resources.
    fn close(&mut self);
}

/// Panning random texture.
///
/// Frame `k` shows the base texture shifted by `k * (pan_x, pan_y)` with
/// wrap-around, so the block at `(x, y)` of frame `k + 1` matches the
/// reference frame `k` at `(x + pan_x, y + pan_y)` wherever that block
/// stays inside the frame.
#[derive(Debug, Default)]
pub struct SyntheticSource {
    config: Option<SourceConfig>,
    texture: Vec<u8>,
    noise_rng: Option<ChaCha8Rng>,
    sequence: u64,
}

/// Mixed into the seed so texture and noise streams differ.
const NOISE_STREAM: u64 = 0x6e6f_6973_655f_7631;

impl SyntheticSource {
    /// Creates a source with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a source directly from a configuration.
    pub fn with_config(config: &SourceConfig) -> Result<Self, SourceError> {
        let mut source = Self::new();
        source.open(config)?;
        Ok(source)
    }

    /// Number of frames produced since the source was opened.
    pub fn frames_produced(&self) -> u64 {
        self.sequence
    }

    fn render(&mut self, config: &SourceConfig) -> Vec<u8> {
        let width = config.width as i64;
        let height = config.height as i64;
        let offset_x = self.sequence as i64 * config.pan_x as i64;
        let offset_y = self.sequence as i64 * config.pan_y as i64;

        let mut pixels = Vec::with_capacity((config.width * config.height) as usize);
        for y in 0..height {
            let src_y = (y + offset_y).rem_euclid(height);
            for x in 0..width {
                let src_x = (x + offset_x).rem_euclid(width);
                pixels.push(self.texture[(src_y * width + src_x) as usize]);
            }
        }

        if config.noise > 0 {
            if let Some(rng) = self.noise_rng.as_mut() {
                let span = 2 * config.noise as u32 + 1;
                for pixel in pixels.iter_mut() {
                    let delta = (rng.next_u32() % span) as i16 - config.noise as i16;
                    *pixel = (*pixel as i16 + delta).clamp(0, 255) as u8;
                }
            }
        }

        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn open(&mut self, config: &SourceConfig) -> Result<(), SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::ConfigFailed(e.to_string()))?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut texture = vec![0u8; (config.width * config.height) as usize];
        rng.fill_bytes(&mut texture);

        self.texture = texture;
        self.noise_rng = Some(ChaCha8Rng::seed_from_u64(config.seed ^ NOISE_STREAM));
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!("SyntheticSource opened with config: {:?}", config);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let config = self.config.clone().ok_or(SourceError::NotInitialized)?;

        if config.max_frames > 0 && self.sequence >= config.max_frames {
            return Err(SourceError::CaptureFailed(format!(
                "frame limit of {} reached",
                config.max_frames
            )));
        }

        let pixels = self.render(&config);
        self.sequence += 1;
        Ok(Frame::new(pixels, config.width, config.height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        self.texture.clear();
        self.noise_rng = None;
        tracing::info!("SyntheticSource closed");
    }
}

//! Frames, frame sources and run configuration.
//!
//! The core only ever sees two equally sized grayscale frames. How they
//! are obtained is the business of a [`FrameSource`]; this module ships a
//! deterministic synthetic one so the pipeline can run without hardware.

mod config;
mod frame;
mod source;

pub use config::{ConfigError, FileConfig, OutputConfig, PredictionConfig, SourceConfig};
pub use frame::{Block, Frame, SignedFrame};
pub use source::{FrameSource, SourceError, SyntheticSource};

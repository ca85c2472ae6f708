//! photo-capa: 是正前/是正後の写真ペアを判定し、CAPAカタログと照合して報告書を作る

pub mod catalog;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod imaging;
pub mod logging;
pub mod pipeline;
pub mod scanner;

pub use error::{PhotoCapaError, Result};
pub use pipeline::{PairingPipeline, ProcessedPair};

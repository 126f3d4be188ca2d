//! Error types for the tempo detection engine

use std::fmt;

/// Errors surfaced by the tempo detection engine
///
/// Configuration problems are reported at construction time. The streaming
/// path itself never fails: runtime numerical conditions (empty histogram
/// bucket, all-zero spectrum) are absorbed as "no emission this tick".
#[derive(Debug, Clone)]
pub enum DetectorError {
    /// Invalid configuration parameters
    InvalidConfig(String),
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for DetectorError {}

// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the image-deduplication engine.
//!
//! Provides structured error handling with detailed context for debugging.

use std::fmt;

/// Standard Result type for all engine operations.
pub type ReedResult<T> = Result<T, ReedError>;

/// Error types for engine operations.
#[derive(Debug, Clone)]
pub enum ReedError {
    /// I/O error during file or arena operations.
    IoError { operation: String, reason: String },

    /// Arena mmap/resize/flush failure.
    ArenaError { operation: String, reason: String },

    /// The B+-tree header magic did not match `BTDB`.
    SignatureMismatch { expected: u32, found: u32 },

    /// The B+-tree header branching factor did not match the compiled one.
    BranchingFactorMismatch { expected: u16, found: u16 },

    /// Thumbnail cache header magic did not match `TMBC`.
    CacheSignatureMismatch { expected: u32, found: u32 },

    /// `search_range` called with `kmax < kmin`.
    InvalidRange { kmin: f32, kmax: f32 },

    /// A tree consistency check failed (range-walk count disagreed with
    /// the in-leaf position, or header counts disagreed with a tree walk).
    ConsistencyError { reason: String },

    /// Insert rejected because the tree was built in `reject` duplicate mode
    /// and the key already exists.
    DuplicateKey { key: f32 },

    /// Cache record whose `thumbfsize` exceeds the 10 MiB sanity ceiling.
    CacheRecordTooLarge { filename: String, size: usize },

    /// A filename exceeded the single-byte length prefix (255 bytes).
    FilenameTooLong { filename: String },

    /// Codec (decode/encode/resample) failure.
    CodecError { reason: String },

    /// Unsupported compare method selected in configuration.
    UnsupportedCompareMethod { method: String },

    /// Serialisation error.
    SerializationError { reason: String },

    /// Deserialisation error.
    DeserializationError { reason: String },
}

impl fmt::Display for ReedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError { operation, reason } => {
                write!(f, "I/O error during '{}': {}", operation, reason)
            }
            Self::ArenaError { operation, reason } => {
                write!(f, "arena error during '{}': {}", operation, reason)
            }
            Self::SignatureMismatch { expected, found } => {
                write!(
                    f,
                    "bad B+-tree file signature: expected 0x{:08X}, found 0x{:08X}",
                    expected, found
                )
            }
            Self::BranchingFactorMismatch { expected, found } => {
                write!(
                    f,
                    "branching factor mismatch: compiled for {}, file has {}",
                    expected, found
                )
            }
            Self::CacheSignatureMismatch { expected, found } => {
                write!(
                    f,
                    "bad thumbnail cache signature: expected 0x{:08X}, found 0x{:08X}",
                    expected, found
                )
            }
            Self::InvalidRange { kmin, kmax } => {
                write!(f, "invalid range: kmax ({}) < kmin ({})", kmax, kmin)
            }
            Self::ConsistencyError { reason } => {
                write!(f, "consistency check failed: {}", reason)
            }
            Self::DuplicateKey { key } => {
                write!(f, "duplicate key {} rejected (reject mode)", key)
            }
            Self::CacheRecordTooLarge { filename, size } => {
                write!(
                    f,
                    "cache record for '{}' is {} bytes, exceeds 10 MiB ceiling",
                    filename, size
                )
            }
            Self::FilenameTooLong { filename } => {
                write!(f, "filename too long for cache entry: '{}'", filename)
            }
            Self::CodecError { reason } => {
                write!(f, "codec error: {}", reason)
            }
            Self::UnsupportedCompareMethod { method } => {
                write!(f, "compare method '{}' is not implemented", method)
            }
            Self::SerializationError { reason } => {
                write!(f, "serialisation error: {}", reason)
            }
            Self::DeserializationError { reason } => {
                write!(f, "deserialisation error: {}", reason)
            }
        }
    }
}

impl std::error::Error for ReedError {}

impl From<std::io::Error> for ReedError {
    fn from(err: std::io::Error) -> Self {
        ReedError::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let err = ReedError::SignatureMismatch {
            expected: 0x42544442,
            found: 0,
        };
        assert_eq!(
            err.to_string(),
            "bad B+-tree file signature: expected 0x42544442, found 0x00000000"
        );

        let err = ReedError::InvalidRange { kmin: 5.0, kmax: 1.0 };
        assert_eq!(err.to_string(), "invalid range: kmax (1) < kmin (5)");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ReedError = io_err.into();
        assert!(matches!(err, ReedError::IoError { .. }));
    }
}

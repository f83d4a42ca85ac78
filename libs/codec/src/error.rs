//! Codec-level errors for FIX tag-value processing
//!
//! Encoding never fails. Decoding fails hard only on empty input or when a
//! strict [`DecodePolicy`](crate::DecodePolicy) rejects the message; tokens
//! that cannot be parsed are reported as soft [`CodecError::MalformedField`]
//! entries and skipped.

use thiserror::Error;

/// Longest token excerpt kept in a diagnostic
const TOKEN_EXCERPT_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Decode was handed zero bytes
    #[error("Empty message: decode called on zero-length input")]
    EmptyMessage,

    /// Token skipped by the decoder; never returned as a hard error
    #[error("Malformed field at byte {offset}: {reason} (token: {token:?})")]
    MalformedField {
        offset: usize,
        token: String,
        reason: &'static str,
    },

    /// Declared CheckSum (10) differs from the byte sum before it
    #[error("Checksum mismatch: declared {declared:?}, computed {computed:03}")]
    ChecksumMismatch { declared: String, computed: u8 },

    /// Checksum verification requested but no 10= field was found
    #[error("Missing checksum: no 10= field in message")]
    MissingChecksum,

    /// Body tag repeated while duplicate rejection is enabled
    #[error("Duplicate body tag {tag}")]
    DuplicateTag { tag: u32 },
}

impl CodecError {
    pub(crate) fn malformed_field(offset: usize, token: &[u8], reason: &'static str) -> Self {
        let excerpt = &token[..token.len().min(TOKEN_EXCERPT_LEN)];
        Self::MalformedField {
            offset,
            token: String::from_utf8_lossy(excerpt).into_owned(),
            reason,
        }
    }

    /// Soft errors are collected during decode instead of aborting it
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::MalformedField { .. })
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_field_truncates_token() {
        let token = vec![b'x'; 100];
        match CodecError::malformed_field(7, &token, "missing '='") {
            CodecError::MalformedField { offset, token, reason } => {
                assert_eq!(offset, 7);
                assert_eq!(token.len(), TOKEN_EXCERPT_LEN);
                assert_eq!(reason, "missing '='");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_soft_classification() {
        assert!(CodecError::malformed_field(0, b"abc", "x").is_soft());
        assert!(!CodecError::EmptyMessage.is_soft());
        assert!(!CodecError::DuplicateTag { tag: 55 }.is_soft());
    }

    #[test]
    fn test_checksum_display_is_three_digits() {
        let err = CodecError::ChecksumMismatch {
            declared: "123".into(),
            computed: 7,
        };
        assert!(err.to_string().contains("computed 007"));
    }
}

//! # Decode Policy
//!
//! Strictness knobs for the decoder. The default is fully permissive:
//! checksum ignored and duplicate body tags resolved last-wins. Deployments
//! that receive from untrusted or unreliable peers can tighten either knob
//! through configuration.

use serde::{Deserialize, Serialize};

/// What to do with the CheckSum (10) field on decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumValidation {
    /// Consume the field without checking it
    #[default]
    Ignore,
    /// Recompute over the bytes preceding `10=` and fail on mismatch or absence
    Verify,
}

/// What to do when a body tag appears more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTagPolicy {
    /// Later occurrence replaces the earlier one
    #[default]
    LastWins,
    /// Fail with [`CodecError::DuplicateTag`](crate::CodecError::DuplicateTag)
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodePolicy {
    pub checksum: ChecksumValidation,
    pub duplicate_tags: DuplicateTagPolicy,
}

impl DecodePolicy {
    /// Accept anything that yields a message
    pub const fn lenient() -> Self {
        Self {
            checksum: ChecksumValidation::Ignore,
            duplicate_tags: DuplicateTagPolicy::LastWins,
        }
    }

    /// Verify checksums and reject duplicate body tags
    pub const fn strict() -> Self {
        Self {
            checksum: ChecksumValidation::Verify,
            duplicate_tags: DuplicateTagPolicy::Reject,
        }
    }

    /// Build from the boolean switches used in configuration files
    pub const fn from_flags(verify_checksum: bool, strict_duplicate_tags: bool) -> Self {
        Self {
            checksum: if verify_checksum {
                ChecksumValidation::Verify
            } else {
                ChecksumValidation::Ignore
            },
            duplicate_tags: if strict_duplicate_tags {
                DuplicateTagPolicy::Reject
            } else {
                DuplicateTagPolicy::LastWins
            },
        }
    }

    pub fn verifies_checksum(&self) -> bool {
        self.checksum == ChecksumValidation::Verify
    }

    pub fn rejects_duplicates(&self) -> bool {
        self.duplicate_tags == DuplicateTagPolicy::Reject
    }
}

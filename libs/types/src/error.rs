//! Message construction and validation errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// A required header field is empty
    #[error("missing required header field {name} (tag {tag})")]
    MissingHeaderField { tag: u32, name: &'static str },

    /// Body tag was already present
    #[error("duplicate body tag {tag}")]
    DuplicateTag { tag: u32 },

    /// Header and trailer tags have dedicated setters and cannot be body fields
    #[error("tag {tag} is reserved for the header/trailer and cannot be a body field")]
    ReservedTag { tag: u32 },
}

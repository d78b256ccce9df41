//! Definition of errors.

use std::{io, result};

/// A specialized Result type for UTrie.
pub type Result<T, E = TrieError> = result::Result<T, E>;

/// Errors in UTrie.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    /// Contains [`RangeError`].
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Contains [`WidthError`].
    #[error(transparent)]
    Width(#[from] WidthError),

    /// Contains [`ScaleError`].
    #[error(transparent)]
    Scale(#[from] ScaleError),

    /// Contains [`MalformedError`].
    #[error(transparent)]
    Malformed(#[from] MalformedError),

    /// Contains [`RejectedVersionError`].
    #[error(transparent)]
    RejectedVersion(#[from] RejectedVersionError),

    /// I/O failure of a caller-supplied reader or writer.
    #[error("IoError: {0}")]
    Io(#[from] io::Error),
}

impl TrieError {
    pub(crate) const fn range(start: u32, end: u32, max: u32) -> Self {
        Self::Range(RangeError { start, end, max })
    }
    pub(crate) const fn width(value: u32, bits: u8) -> Self {
        Self::Width(WidthError { value, bits })
    }
    pub(crate) const fn scale(arg: &'static str, max: u32) -> Self {
        Self::Scale(ScaleError { arg, max })
    }
    pub(crate) const fn malformed(msg: &'static str) -> Self {
        Self::Malformed(MalformedError { msg })
    }
    pub(crate) const fn rejected(version: [u8; 4]) -> Self {
        Self::RejectedVersion(RejectedVersionError { version })
    }
}

/// Error used when an ordinal or an ordinal range is outside of the domain,
/// or when `start > end`.
#[derive(Debug, thiserror::Error)]
#[error("RangeError: [{start:#x}..={end:#x}] is not a valid range within [0..={max:#x}]")]
pub struct RangeError {
    start: u32,
    end: u32,
    max: u32,
}

impl RangeError {
    /// First ordinal of the rejected range.
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// Last ordinal of the rejected range.
    pub const fn end(&self) -> u32 {
        self.end
    }
}

/// Error used when a stored value does not fit the requested value width.
#[derive(Debug, thiserror::Error)]
#[error("WidthError: value {value:#x} does not fit in {bits} bits")]
pub struct WidthError {
    value: u32,
    bits: u8,
}

impl WidthError {
    /// The first offending value.
    pub const fn value(&self) -> u32 {
        self.value
    }
}

/// Error used when the compacted arrays exceed what the format can address.
#[derive(Debug, thiserror::Error)]
#[error("ScaleError: {arg} must be no greater than {max}")]
pub struct ScaleError {
    arg: &'static str,
    max: u32,
}

/// Error used when a serialized stream is inconsistent.
#[derive(Debug, thiserror::Error)]
#[error("MalformedError: {msg}")]
pub struct MalformedError {
    msg: &'static str,
}

/// Error used when a well-formed stream carries a version that the caller's
/// predicate does not accept.
#[derive(Debug, thiserror::Error)]
#[error(
    "RejectedVersionError: data version {}.{}.{}.{} is not acceptable",
    .version[0],
    .version[1],
    .version[2],
    .version[3]
)]
pub struct RejectedVersionError {
    version: [u8; 4],
}

impl RejectedVersionError {
    /// The rejected version bytes.
    pub const fn version(&self) -> [u8; 4] {
        self.version
    }
}

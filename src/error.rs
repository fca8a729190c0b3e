use std::{error, fmt, io};

/// An error produced by the slicing, mate-resolution, staging, or
/// slice-header codec stages of the write path (§7).
#[derive(Debug)]
pub enum Error {
    /// Slice header block content-type mismatch, truncation, or an
    /// impossible field combination (e.g. a multi-reference slice inside a
    /// single-reference container).
    Structural(StructuralError),
    /// A policy violation: mapped record after unmapped in a coord-sorted
    /// stream, or an [`crate::IndexEntry`] constructed from a multi-reference
    /// context or an unmapped context with a non-sentinel alignment.
    Policy(PolicyError),
    /// The partitioner was asked to transition from `Uninitialized` while
    /// records had already accumulated. Fatal and unrecoverable.
    State(StateError),
    /// A failure from the block codec or the reference provider
    /// collaborator.
    Io(io::Error),
}

/// A structural error detail.
#[derive(Debug)]
pub enum StructuralError {
    /// The slice header block's content-type did not match the expected
    /// "mapped slice header" type.
    ContentTypeMismatch,
    /// The slice header block ended before all fields were read.
    Truncated,
    /// The slice header block had bytes remaining after all known fields
    /// (including the tag chain, when present) were consumed.
    TrailingData,
    /// A slice header was asked to serialize an
    /// [`crate::ReferenceContext::Uninitialized`] context, which has no
    /// wire representation.
    UninitializedContext,
    /// A tag chain entry declared an unrecognized value-type code.
    /// Surfaced only under [`crate::ValidationStringency::Strict`]; under
    /// `Lenient`/`Silent` the offending tag is dropped instead (§4.4
    /// "Error conditions").
    InvalidTagValueType(u8),
}

/// A policy error detail.
#[derive(Debug)]
pub enum PolicyError {
    /// A mapped record followed an unmapped record in a coordinate-sorted
    /// stream (§4.1, `Unmapped` → mapped, coord-sorted).
    MappedAfterUnmapped,
    /// An [`crate::IndexEntry`] was constructed from a [`crate::ReferenceContext::MultiRef`]
    /// context.
    IndexEntryFromMultiRef,
    /// An [`crate::IndexEntry`] was constructed from an unmapped context with
    /// a non-sentinel alignment span.
    IndexEntryUnmappedAlignment,
}

/// A state error detail.
#[derive(Debug)]
pub enum StateError {
    /// [`crate::SlicePartitioner`] was asked to transition from
    /// `Uninitialized` while `accumulatedRecordCount` was non-zero.
    UninitializedWithRecords,
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(e) => write!(f, "structural error: {e}"),
            Self::Policy(e) => write!(f, "policy error: {e}"),
            Self::State(e) => write!(f, "state error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentTypeMismatch => write!(f, "slice header block has the wrong content type"),
            Self::Truncated => write!(f, "slice header block is truncated"),
            Self::TrailingData => write!(f, "slice header block has trailing data"),
            Self::UninitializedContext => {
                write!(f, "cannot serialize a slice header with an uninitialized reference context")
            }
            Self::InvalidTagValueType(b) => {
                write!(f, "slice header tag chain has an unrecognized value type {b:#04x}")
            }
        }
    }
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MappedAfterUnmapped => {
                write!(f, "mapped record follows unmapped record in coordinate-sorted input")
            }
            Self::IndexEntryFromMultiRef => write!(f, "index entry constructed from a multi-reference context"),
            Self::IndexEntryUnmappedAlignment => {
                write!(f, "index entry for an unmapped context has a non-sentinel alignment")
            }
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UninitializedWithRecords => {
                write!(f, "partitioner asked to transition from Uninitialized with records already accumulated")
            }
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<StructuralError> for Error {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}

impl From<PolicyError> for Error {
    fn from(e: PolicyError) -> Self {
        Self::Policy(e)
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Self::State(e)
    }
}

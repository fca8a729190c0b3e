//! Slice partitioning, mate resolution, and slice/index assembly for the
//! CRAM write path.
//!
//! This crate owns the part of a CRAM writer that decides how a stream of
//! aligned records is carved into slices and containers, resolves mate-pair
//! relationships within a slice, serializes slice headers, and produces
//! per-slice index entries for a coordinate-sorted binary index (BAI-style).
//!
//! Block compression, the compression-header builder, reference sequence
//! storage, record-level base/quality encoding, and the file-level container
//! iterator are external collaborators: they are represented here only as
//! trait boundaries ([`ReferenceSequenceProvider`], [`BlockCodec`]).

pub mod alignment_span;
pub mod collaborators;
pub mod error;
pub mod index_entry;
pub mod mate_resolver;
pub mod num;
pub mod partitioner;
pub mod record;
pub mod reference_context;
pub mod slice;
pub mod stager;
pub mod validation;
pub mod version;

pub use alignment_span::AlignmentSpan;
pub use collaborators::{BlockCodec, ReferenceSequenceProvider};
pub use error::Error;
pub use index_entry::IndexEntry;
pub use partitioner::{Directive, PartitionerConfig, SlicePartitioner};
pub use record::{Flags, SliceRecord};
pub use reference_context::ReferenceContext;
pub use stager::SliceStager;
pub use validation::ValidationStringency;
pub use version::Version;

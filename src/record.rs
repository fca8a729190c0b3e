//! The minimal per-record view the write-side slicing pipeline needs.
//!
//! Base/quality/read-feature encoding is an external collaborator (§1
//! "Out of scope"); this module models only what [`crate::partitioner`],
//! [`crate::mate_resolver`], and [`crate::index_entry`] read from a record.

use bitflags::bitflags;
use bstr::BString;

bitflags! {
    /// SAM-style alignment flags (BAM `flag` field), used by
    /// [`crate::mate_resolver`] to validate a candidate mate (§4.2
    /// `acceptMate`) and to tell primary from secondary/supplementary
    /// alignments.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Flags: u16 {
        /// The record is one segment of a template with multiple segments
        /// (i.e. it is paired).
        const SEGMENTED = 0x0001;
        /// Each segment is properly aligned according to the aligner.
        const PROPERLY_ALIGNED = 0x0002;
        /// The record itself is unmapped.
        const UNMAPPED = 0x0004;
        /// The record's mate is unmapped.
        const MATE_UNMAPPED = 0x0008;
        /// The record is on the reverse strand.
        const REVERSE_COMPLEMENTED = 0x0010;
        /// The record's mate is on the reverse strand.
        const MATE_REVERSE_COMPLEMENTED = 0x0020;
        /// The record is the first segment of its template.
        const FIRST_SEGMENT = 0x0040;
        /// The record is the last segment of its template.
        const LAST_SEGMENT = 0x0080;
        /// The record is a secondary alignment.
        const SECONDARY = 0x0100;
        /// The record failed a quality/vendor check.
        const QC_FAIL = 0x0200;
        /// The record is a PCR or optical duplicate.
        const DUPLICATE = 0x0400;
        /// The record is a supplementary alignment.
        const SUPPLEMENTARY = 0x0800;
    }
}

impl Flags {
    /// Returns `true` if the record is one segment of a multi-segment
    /// template.
    pub fn is_segmented(&self) -> bool {
        self.contains(Self::SEGMENTED)
    }

    /// Returns `true` if the record itself is unmapped.
    pub fn is_unmapped(&self) -> bool {
        self.contains(Self::UNMAPPED)
    }

    /// Returns `true` if the record's declared mate is unmapped.
    pub fn is_mate_unmapped(&self) -> bool {
        self.contains(Self::MATE_UNMAPPED)
    }

    /// Returns `true` if the record is on the reverse strand.
    pub fn is_reverse_complemented(&self) -> bool {
        self.contains(Self::REVERSE_COMPLEMENTED)
    }

    /// Returns `true` if the record's declared mate is on the reverse
    /// strand.
    pub fn is_mate_reverse_complemented(&self) -> bool {
        self.contains(Self::MATE_REVERSE_COMPLEMENTED)
    }

    /// Returns `true` if the record is a secondary alignment.
    pub fn is_secondary(&self) -> bool {
        self.contains(Self::SECONDARY)
    }

    /// Returns `true` if the record is a supplementary alignment.
    pub fn is_supplementary(&self) -> bool {
        self.contains(Self::SUPPLEMENTARY)
    }
}

/// A single aligned record as seen by the slicing/mate-resolution pipeline.
///
/// This is a reduced view: it carries exactly the fields the core needs
/// (reference placement, mate hints, and a mate-linkage slot it owns) and
/// leaves bases, qualities, and tags to the record encoder collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceRecord {
    /// The reference sequence the record aligns to, or `None` if unmapped.
    pub reference_sequence_id: Option<usize>,
    /// The 1-based alignment start, or `None` if unmapped/unplaced.
    pub alignment_start: Option<i32>,
    /// The inclusive 1-based alignment end, or `None` if unmapped/unplaced.
    pub alignment_end: Option<i32>,
    /// The SAM-style alignment flags.
    pub flags: Flags,
    /// The read name, if present.
    pub name: Option<BString>,
    /// The reference sequence the record's declared mate aligns to.
    pub mate_reference_sequence_id: Option<usize>,
    /// The record's own declaration of its mate's 1-based alignment start.
    pub mate_alignment_start: Option<i32>,
    /// The in-slice index of this record's resolved mate, set by
    /// [`crate::mate_resolver::resolve_mates`].
    pub mate_index: Option<usize>,
    /// `true` if this record's mate could not be resolved in-slice and its
    /// mate info must be stored verbatim rather than as an intra-slice
    /// reference (§4.2, "detached").
    pub detached: bool,
}

impl SliceRecord {
    /// Creates a record with no mate resolved yet.
    pub fn new(
        reference_sequence_id: Option<usize>,
        alignment_start: Option<i32>,
        alignment_end: Option<i32>,
        flags: Flags,
        name: Option<BString>,
        mate_reference_sequence_id: Option<usize>,
        mate_alignment_start: Option<i32>,
    ) -> Self {
        Self {
            reference_sequence_id,
            alignment_start,
            alignment_end,
            flags,
            name,
            mate_reference_sequence_id,
            mate_alignment_start,
            mate_index: None,
            detached: false,
        }
    }

    /// Returns `true` if the record is mapped (placed on a reference).
    pub fn is_mapped(&self) -> bool {
        !self.flags.is_unmapped() && self.reference_sequence_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_accessors() {
        let flags = Flags::SEGMENTED | Flags::MATE_UNMAPPED | Flags::SECONDARY;
        assert!(flags.is_segmented());
        assert!(flags.is_mate_unmapped());
        assert!(flags.is_secondary());
        assert!(!flags.is_reverse_complemented());
    }

    #[test]
    fn test_is_mapped() {
        let mapped = SliceRecord::new(Some(0), Some(1), Some(10), Flags::empty(), None, None, None);
        assert!(mapped.is_mapped());

        let unmapped = SliceRecord::new(None, None, None, Flags::UNMAPPED, None, None, None);
        assert!(!unmapped.is_mapped());
    }
}

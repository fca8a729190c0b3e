use std::{cmp, fmt};

use crate::error::PolicyError;

/// Alignment extent and per-category record counts for a slice or a
/// decomposed constituent of a multi-reference slice (§3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlignmentSpan {
    alignment_start: i32,
    alignment_span: i32,
    mapped_count: u32,
    unmapped_placed_count: u32,
    unmapped_unplaced_count: u32,
}

impl AlignmentSpan {
    /// Creates a placed alignment span.
    ///
    /// `alignment_start` is 1-based. Both `alignment_start` and
    /// `alignment_span` must be non-negative.
    pub fn placed(
        alignment_start: i32,
        alignment_span: i32,
        mapped_count: u32,
        unmapped_placed_count: u32,
    ) -> Result<Self, PolicyError> {
        if alignment_start < 0 || alignment_span < 0 {
            return Err(PolicyError::IndexEntryUnmappedAlignment);
        }

        Ok(Self {
            alignment_start,
            alignment_span,
            mapped_count,
            unmapped_placed_count,
            unmapped_unplaced_count: 0,
        })
    }

    /// Creates an unmapped-unplaced alignment span.
    ///
    /// `strict` rejects the legacy `alignment_start = -1`, `alignment_span
    /// = 1` construction permitted for backward compatibility with older
    /// inputs (§9 "Open questions", second bullet); non-strict mode accepts
    /// `alignment_start ∈ {0, -1}` and `alignment_span ∈ {0, 1}`.
    pub fn unmapped_unplaced(
        alignment_start: i32,
        alignment_span: i32,
        unmapped_unplaced_count: u32,
        strict: bool,
    ) -> Result<Self, PolicyError> {
        let start_ok = if strict {
            alignment_start == 0
        } else {
            alignment_start == 0 || alignment_start == -1
        };

        let span_ok = if strict {
            alignment_span == 0
        } else {
            alignment_span == 0 || alignment_span == 1
        };

        if !start_ok || !span_ok {
            return Err(PolicyError::IndexEntryUnmappedAlignment);
        }

        Ok(Self {
            alignment_start,
            alignment_span,
            mapped_count: 0,
            unmapped_placed_count: 0,
            unmapped_unplaced_count,
        })
    }

    /// The 1-based alignment start (0 for unplaced).
    pub fn alignment_start(&self) -> i32 {
        self.alignment_start
    }

    /// The alignment length (0 for pure-unplaced, 1 tolerated for legacy
    /// inputs).
    pub fn alignment_span(&self) -> i32 {
        self.alignment_span
    }

    /// The inclusive alignment end, `alignment_start + alignment_span - 1`.
    pub fn alignment_end(&self) -> i32 {
        self.alignment_start + self.alignment_span - 1
    }

    /// The count of placed, mapped records.
    pub fn mapped_count(&self) -> u32 {
        self.mapped_count
    }

    /// The count of placed, unmapped records.
    pub fn unmapped_placed_count(&self) -> u32 {
        self.unmapped_placed_count
    }

    /// The count of unplaced, unmapped records.
    pub fn unmapped_unplaced_count(&self) -> u32 {
        self.unmapped_unplaced_count
    }

    /// Widens this span to also cover `other`, summing counts and taking
    /// the union of the alignment intervals. Used when folding per-record
    /// statistics into a running per-context span during slice assembly.
    pub fn extend(&mut self, other: &Self) {
        if self.alignment_span > 0 && other.alignment_span > 0 {
            let start = cmp::min(self.alignment_start, other.alignment_start);
            let end = cmp::max(self.alignment_end(), other.alignment_end());
            self.alignment_start = start;
            self.alignment_span = end - start + 1;
        } else if other.alignment_span > 0 {
            self.alignment_start = other.alignment_start;
            self.alignment_span = other.alignment_span;
        }

        self.mapped_count += other.mapped_count;
        self.unmapped_placed_count += other.unmapped_placed_count;
        self.unmapped_unplaced_count += other.unmapped_unplaced_count;
    }
}

impl fmt::Display for AlignmentSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{} (mapped={}, unmapped_placed={}, unmapped_unplaced={})",
            self.alignment_start,
            self.alignment_span,
            self.mapped_count,
            self.unmapped_placed_count,
            self.unmapped_unplaced_count
        )
    }
}

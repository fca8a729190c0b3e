use std::{cmp, collections::BTreeMap};

use crate::{
    alignment_span::AlignmentSpan, error::Error, error::PolicyError, reference_context::ReferenceContext,
    slice::Slice,
};

/// A per-slice (or per-constituent-context) record suitable for a
/// coordinate-sorted binary index (§3, §4.5).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexEntry {
    reference_context: ReferenceContext,
    alignment_span: AlignmentSpan,
    container_start_byte_offset: i64,
    slice_offset_from_compression_header: i64,
    landmark_index: i32,
}

impl IndexEntry {
    /// Creates an index entry.
    ///
    /// Rejects a [`ReferenceContext::MultiRef`] context: the invariant in
    /// §3 requires multi-reference slices to be decomposed into per-context
    /// spans before an entry is ever constructed.
    pub fn new(
        reference_context: ReferenceContext,
        alignment_span: AlignmentSpan,
        container_start_byte_offset: i64,
        slice_offset_from_compression_header: i64,
        landmark_index: i32,
    ) -> Result<Self, PolicyError> {
        if reference_context.is_many() {
            return Err(PolicyError::IndexEntryFromMultiRef);
        }

        Ok(Self {
            reference_context,
            alignment_span,
            container_start_byte_offset,
            slice_offset_from_compression_header,
            landmark_index,
        })
    }

    /// The reference context this entry describes. Never `MultiRef`.
    pub fn reference_context(&self) -> ReferenceContext {
        self.reference_context
    }

    /// The alignment extent and record counts this entry describes.
    pub fn alignment_span(&self) -> &AlignmentSpan {
        &self.alignment_span
    }

    /// The byte offset of the owning container within the file.
    pub fn container_start_byte_offset(&self) -> i64 {
        self.container_start_byte_offset
    }

    /// The slice's byte offset from the end of the container's compression
    /// header.
    pub fn slice_offset_from_compression_header(&self) -> i64 {
        self.slice_offset_from_compression_header
    }

    /// The slice's 0-based position within its container's slice array
    /// (the landmark index, §4.5).
    pub fn landmark_index(&self) -> i32 {
        self.landmark_index
    }

    /// Builds the index entries for one sealed slice (§4.5).
    ///
    /// A single-reference or unmapped slice contributes exactly one entry.
    /// A multi-reference slice is decomposed into one entry per distinct
    /// constituent reference context - including the unmapped-unplaced
    /// partition, if any - grounded on the teacher's own multi-reference
    /// BAI-row assembly (`indexer.rs`'s
    /// `push_index_records_for_multi_reference_slice`, which folds each
    /// record's reference id into a per-id inclusive alignment range).
    /// Entries come out in ascending reference id order with
    /// unmapped-unplaced last (§4.5, §5 "Ordering guarantees").
    pub fn from_slice(
        slice: &Slice,
        container_start_byte_offset: i64,
        slice_offset_from_compression_header: i64,
        landmark_index: i32,
    ) -> Result<Vec<Self>, Error> {
        if slice.header.reference_context.is_many() {
            Self::decompose_multi_reference(
                slice,
                container_start_byte_offset,
                slice_offset_from_compression_header,
                landmark_index,
            )
        } else {
            let span = Self::whole_slice_span(slice)?;
            let entry = Self::new(
                slice.header.reference_context,
                span,
                container_start_byte_offset,
                slice_offset_from_compression_header,
                landmark_index,
            )?;

            Ok(vec![entry])
        }
    }

    fn whole_slice_span(slice: &Slice) -> Result<AlignmentSpan, Error> {
        if slice.header.reference_context.is_unmapped() {
            let span = AlignmentSpan::unmapped_unplaced(
                slice.header.alignment_start,
                slice.header.alignment_span,
                slice.records.len() as u32,
                true,
            )?;
            Ok(span)
        } else {
            let mapped_count = slice.records.iter().filter(|r| r.is_mapped()).count() as u32;
            let unmapped_placed_count = slice.records.len() as u32 - mapped_count;
            let span = AlignmentSpan::placed(
                slice.header.alignment_start,
                slice.header.alignment_span,
                mapped_count,
                unmapped_placed_count,
            )?;
            Ok(span)
        }
    }

    fn decompose_multi_reference(
        slice: &Slice,
        container_start_byte_offset: i64,
        slice_offset_from_compression_header: i64,
        landmark_index: i32,
    ) -> Result<Vec<Self>, Error> {
        #[derive(Default)]
        struct Range {
            start: i32,
            end: i32,
            mapped_count: u32,
            unmapped_placed_count: u32,
            has_position: bool,
        }

        let mut by_reference: BTreeMap<usize, Range> = BTreeMap::new();
        let mut unmapped_unplaced_count = 0u32;

        for record in &slice.records {
            let Some(id) = record.reference_sequence_id else {
                unmapped_unplaced_count += 1;
                continue;
            };

            let range = by_reference.entry(id).or_insert_with(|| Range {
                start: i32::MAX,
                end: 0,
                ..Range::default()
            });

            if let (Some(start), Some(end)) = (record.alignment_start, record.alignment_end) {
                range.start = cmp::min(range.start, start);
                range.end = cmp::max(range.end, end);
                range.has_position = true;
            }

            if record.is_mapped() {
                range.mapped_count += 1;
            } else {
                range.unmapped_placed_count += 1;
            }
        }

        let mut entries = Vec::with_capacity(by_reference.len() + 1);

        for (id, range) in by_reference {
            let (start, span) = if range.has_position {
                (range.start, range.end - range.start + 1)
            } else {
                (0, 0)
            };

            let alignment_span =
                AlignmentSpan::placed(start, span, range.mapped_count, range.unmapped_placed_count)?;

            entries.push(Self::new(
                ReferenceContext::SingleRef(id),
                alignment_span,
                container_start_byte_offset,
                slice_offset_from_compression_header,
                landmark_index,
            )?);
        }

        if unmapped_unplaced_count > 0 {
            let alignment_span =
                AlignmentSpan::unmapped_unplaced(0, 0, unmapped_unplaced_count, true)?;

            entries.push(Self::new(
                ReferenceContext::Unmapped,
                alignment_span,
                container_start_byte_offset,
                slice_offset_from_compression_header,
                landmark_index,
            )?);
        }

        Ok(entries)
    }
}

impl Eq for IndexEntry {}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    /// Total ordering per §3:
    /// 1. unmapped-unplaced sorts last;
    /// 2. otherwise by reference sequence id ascending;
    /// 3. for placed entries within the same context, by `alignmentStart`
    ///    ascending (skipped for unmapped entries, whose start is
    ///    meaningless);
    /// 4. ties broken on `containerStartByteOffset`, then on
    ///    `sliceOffsetFromCompressionHeader`.
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.reference_context
            .cmp(&other.reference_context)
            .then_with(|| {
                if self.reference_context.is_unmapped() {
                    cmp::Ordering::Equal
                } else {
                    self.alignment_span
                        .alignment_start()
                        .cmp(&other.alignment_span.alignment_start())
                }
            })
            .then_with(|| {
                self.container_start_byte_offset
                    .cmp(&other.container_start_byte_offset)
            })
            .then_with(|| {
                self.slice_offset_from_compression_header
                    .cmp(&other.slice_offset_from_compression_header)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(id: usize, start: i32, offset: i64) -> IndexEntry {
        let span = AlignmentSpan::placed(start, 10, 1, 0).unwrap();
        IndexEntry::new(ReferenceContext::SingleRef(id), span, offset, 0, 0).unwrap()
    }

    fn unmapped(offset: i64) -> IndexEntry {
        let span = AlignmentSpan::unmapped_unplaced(0, 0, 1, true).unwrap();
        IndexEntry::new(ReferenceContext::Unmapped, span, offset, 0, 0).unwrap()
    }

    #[test]
    fn test_rejects_multi_ref() {
        let span = AlignmentSpan::placed(1, 10, 1, 0).unwrap();
        let result = IndexEntry::new(ReferenceContext::MultiRef, span, 0, 0, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_unmapped_sorts_last() {
        let mut entries = vec![unmapped(0), placed(0, 100, 0), placed(1, 5, 0)];
        entries.sort();

        assert_eq!(entries[0], placed(0, 100, 0));
        assert_eq!(entries[1], placed(1, 5, 0));
        assert_eq!(entries[2], unmapped(0));
    }

    #[test]
    fn test_orders_by_reference_id_then_alignment_start() {
        let mut entries = vec![placed(0, 200, 0), placed(0, 100, 0)];
        entries.sort();

        assert_eq!(entries[0].alignment_span().alignment_start(), 100);
        assert_eq!(entries[1].alignment_span().alignment_start(), 200);
    }

    #[test]
    fn test_ties_break_on_byte_offsets() {
        let mut entries = vec![placed(0, 100, 50), placed(0, 100, 10)];
        entries.sort();

        assert_eq!(entries[0].container_start_byte_offset(), 10);
        assert_eq!(entries[1].container_start_byte_offset(), 50);
    }

    #[test]
    fn test_total_and_reflexive() {
        let a = placed(0, 100, 0);
        let b = placed(0, 100, 0);
        assert_eq!(a.cmp(&b), cmp::Ordering::Equal);
    }

    fn record(
        reference_sequence_id: Option<usize>,
        alignment_start: Option<i32>,
        alignment_end: Option<i32>,
        flags: crate::record::Flags,
    ) -> crate::record::SliceRecord {
        crate::record::SliceRecord::new(
            reference_sequence_id,
            alignment_start,
            alignment_end,
            flags,
            None,
            None,
            None,
        )
    }

    fn single_ref_slice() -> Slice {
        let header = crate::slice::Header {
            reference_context: ReferenceContext::SingleRef(2),
            alignment_start: 100,
            alignment_span: 50,
            record_count: 2,
            global_record_counter: 0,
            external_content_ids: Vec::new(),
            embedded_reference_content_id: None,
            reference_md5: None,
            tags: Vec::new(),
        };

        let records = vec![
            record(Some(2), Some(100), Some(149), crate::record::Flags::empty()),
            record(Some(2), Some(110), Some(120), crate::record::Flags::UNMAPPED),
        ];

        Slice::new(header, records)
    }

    #[test]
    fn test_from_slice_single_reference_emits_one_entry() {
        let slice = single_ref_slice();
        let entries = IndexEntry::from_slice(&slice, 0, 0, 0).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reference_context(), ReferenceContext::SingleRef(2));
        assert_eq!(entries[0].alignment_span().alignment_start(), 100);
        assert_eq!(entries[0].alignment_span().mapped_count(), 1);
        assert_eq!(entries[0].alignment_span().unmapped_placed_count(), 1);
    }

    #[test]
    fn test_from_slice_unmapped_emits_one_entry() {
        let header = crate::slice::Header {
            reference_context: ReferenceContext::Unmapped,
            alignment_start: 0,
            alignment_span: 0,
            record_count: 2,
            global_record_counter: 0,
            external_content_ids: Vec::new(),
            embedded_reference_content_id: None,
            reference_md5: None,
            tags: Vec::new(),
        };

        let records = vec![
            record(None, None, None, crate::record::Flags::UNMAPPED),
            record(None, None, None, crate::record::Flags::UNMAPPED),
        ];

        let slice = Slice::new(header, records);
        let entries = IndexEntry::from_slice(&slice, 0, 0, 0).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reference_context(), ReferenceContext::Unmapped);
        assert_eq!(entries[0].alignment_span().unmapped_unplaced_count(), 2);
    }

    #[test]
    fn test_from_slice_multi_reference_decomposes_per_context_and_orders_unmapped_last() {
        let header = crate::slice::Header {
            reference_context: ReferenceContext::MultiRef,
            alignment_start: 0,
            alignment_span: 0,
            record_count: 5,
            global_record_counter: 0,
            external_content_ids: Vec::new(),
            embedded_reference_content_id: None,
            reference_md5: None,
            tags: Vec::new(),
        };

        let records = vec![
            record(Some(3), Some(200), Some(250), crate::record::Flags::empty()),
            record(Some(1), Some(50), Some(99), crate::record::Flags::empty()),
            record(Some(1), Some(10), Some(60), crate::record::Flags::empty()),
            record(None, None, None, crate::record::Flags::UNMAPPED),
            record(None, None, None, crate::record::Flags::UNMAPPED),
        ];

        let slice = Slice::new(header, records);
        let entries = IndexEntry::from_slice(&slice, 7, 3, 1).unwrap();

        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].reference_context(), ReferenceContext::SingleRef(1));
        assert_eq!(entries[0].alignment_span().alignment_start(), 10);
        assert_eq!(entries[0].alignment_span().alignment_end(), 99);
        assert_eq!(entries[0].alignment_span().mapped_count(), 2);

        assert_eq!(entries[1].reference_context(), ReferenceContext::SingleRef(3));
        assert_eq!(entries[1].alignment_span().alignment_start(), 200);

        assert_eq!(entries[2].reference_context(), ReferenceContext::Unmapped);
        assert_eq!(entries[2].alignment_span().unmapped_unplaced_count(), 2);

        for entry in &entries {
            assert_eq!(entry.container_start_byte_offset(), 7);
            assert_eq!(entry.slice_offset_from_compression_header(), 3);
            assert_eq!(entry.landmark_index(), 1);
        }
    }

    #[test]
    fn test_from_slice_multi_reference_without_unplaced_records_has_no_unmapped_entry() {
        let header = crate::slice::Header {
            reference_context: ReferenceContext::MultiRef,
            alignment_start: 0,
            alignment_span: 0,
            record_count: 2,
            global_record_counter: 0,
            external_content_ids: Vec::new(),
            embedded_reference_content_id: None,
            reference_md5: None,
            tags: Vec::new(),
        };

        let records = vec![
            record(Some(0), Some(1), Some(10), crate::record::Flags::empty()),
            record(Some(1), Some(1), Some(10), crate::record::Flags::empty()),
        ];

        let slice = Slice::new(header, records);
        let entries = IndexEntry::from_slice(&slice, 0, 0, 0).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| e.reference_context() != ReferenceContext::Unmapped));
    }
}

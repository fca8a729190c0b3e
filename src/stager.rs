//! Accumulates staged slices for one container until it is sealed (§4.3
//! "Slice staging", §5 "Shared resources").

use md5::{Digest, Md5};

use crate::{
    collaborators::ReferenceSequenceProvider,
    error::Error,
    record::SliceRecord,
    reference_context::ReferenceContext,
    slice::{Header, Slice},
};

/// One slice's worth of records, staged but not yet sealed into a [`Slice`].
struct Staged {
    reference_context: ReferenceContext,
    records: Vec<SliceRecord>,
    global_record_counter: u64,
}

/// Accumulates the slices that will make up one container, in admission
/// order, and seals them into [`Slice`] values on demand (§4.3).
///
/// This type does not decide when to flush a slice or seal a container -
/// that is [`crate::SlicePartitioner`]'s and the caller's job. It only owns
/// the staged records between those two decisions: the homogeneity
/// invariant that all staged slices share one reference context, or there
/// is exactly one multi-reference slice alone, is the caller's
/// responsibility to uphold by how it drives [`SlicePartitioner`] (§8,
/// invariant 2).
pub struct SliceStager<P> {
    reference_sequence_provider: P,
    staged: Vec<Staged>,
}

impl<P> SliceStager<P>
where
    P: ReferenceSequenceProvider,
{
    /// Creates an empty stager backed by `reference_sequence_provider`.
    pub fn new(reference_sequence_provider: P) -> Self {
        Self {
            reference_sequence_provider,
            staged: Vec::new(),
        }
    }

    /// Stages one slice's worth of records under `reference_context`, with
    /// `starting_counter` recording the global record counter value at
    /// which the slice began.
    pub fn stage(
        &mut self,
        reference_context: ReferenceContext,
        records: Vec<SliceRecord>,
        starting_counter: u64,
    ) {
        self.staged.push(Staged {
            reference_context,
            records,
            global_record_counter: starting_counter,
        });
    }

    /// The number of slices staged so far.
    pub fn staged_slice_count(&self) -> usize {
        self.staged.len()
    }

    /// A flat, admission-ordered view across every staged slice's records.
    /// Used by [`crate::mate_resolver`] callers that need to resolve mates
    /// across the whole container rather than one slice at a time.
    pub fn all_records(&self) -> impl Iterator<Item = &SliceRecord> {
        self.staged.iter().flat_map(|slice| slice.records.iter())
    }

    /// Seals every staged slice into a [`Slice`], binding each one's
    /// reference MD5 through the reference sequence provider, and clears
    /// the stager's state.
    ///
    /// A multi-reference slice and an unmapped slice carry no reference
    /// MD5 (§4.3 "reference MD5 binding"): multi-reference records already
    /// declare their own per-record reference ids, and an unmapped slice
    /// has no reference to bind against.
    pub fn seal(&mut self) -> Result<Vec<Slice>, Error> {
        let staged = std::mem::take(&mut self.staged);

        staged
            .into_iter()
            .map(|entry| self.seal_one(entry))
            .collect()
    }

    fn seal_one(&self, staged: Staged) -> Result<Slice, Error> {
        let reference_md5 = match staged.reference_context {
            ReferenceContext::SingleRef(_) => {
                let bases = self.reference_sequence_provider.current_bases()?;
                Some(normalized_sequence_digest(&bases))
            }
            _ => None,
        };

        let (alignment_start, alignment_span) = slice_alignment_extent(&staged.records);

        let header = Header {
            reference_context: staged.reference_context,
            alignment_start,
            alignment_span,
            record_count: staged.records.len() as i32,
            global_record_counter: staged.global_record_counter as i64,
            external_content_ids: Vec::new(),
            embedded_reference_content_id: None,
            reference_md5,
            tags: Vec::new(),
        };

        Ok(Slice::new(header, staged.records))
    }
}

/// Computes a slice header's `alignment_start`/`alignment_span` fields from
/// its records (§6 "Wire format"): the inclusive union of every placed
/// record's alignment interval, or the `(0, 0)` sentinel when none are
/// placed.
fn slice_alignment_extent(records: &[SliceRecord]) -> (i32, i32) {
    let mut start = i32::MAX;
    let mut end = i32::MIN;

    for record in records {
        if let (Some(record_start), Some(record_end)) = (record.alignment_start, record.alignment_end) {
            start = start.min(record_start);
            end = end.max(record_end);
        }
    }

    if start > end { (0, 0) } else { (start, end - start + 1) }
}

/// Computes a reference sequence's `M5` digest: the MD5 of its bases,
/// uppercased and with whitespace removed (grounded on the teacher's
/// `calculate_normalized_sequence_digest`, used the same way in
/// `io::writer::container::slice::build_slice` and `io::writer::header`;
/// the normalization routine itself is not present in the retrieved
/// source, so this reimplements the SAM/CRAM `M5` convention directly
/// against the `md-5` crate already in the dependency stack).
fn normalized_sequence_digest(bases: &[u8]) -> [u8; 16] {
    let normalized: Vec<u8> = bases
        .iter()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| b.to_ascii_uppercase())
        .collect();

    let mut hasher = Md5::new();
    hasher.update(&normalized);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Flags;
    use std::io;

    struct FixedProvider(Vec<u8>);

    impl ReferenceSequenceProvider for FixedProvider {
        fn bases(&self, _reference_sequence_id: usize) -> io::Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn current_bases(&self) -> io::Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    fn record(start: Option<i32>, end: Option<i32>) -> SliceRecord {
        SliceRecord::new(Some(0), start, end, Flags::empty(), None, None, None)
    }

    #[test]
    fn test_seal_binds_reference_md5_for_single_ref_slice() {
        let mut stager = SliceStager::new(FixedProvider(b"acgt".to_vec()));
        stager.stage(
            ReferenceContext::SingleRef(0),
            vec![record(Some(1), Some(4))],
            0,
        );

        let slices = stager.seal().unwrap();
        assert_eq!(slices.len(), 1);
        assert!(slices[0].header.reference_md5.is_some());
        assert_eq!(slices[0].header.alignment_start, 1);
        assert_eq!(slices[0].header.alignment_span, 4);
    }

    #[test]
    fn test_seal_leaves_no_md5_for_multi_reference_slice() {
        let mut stager = SliceStager::new(FixedProvider(b"acgt".to_vec()));
        stager.stage(
            ReferenceContext::MultiRef,
            vec![record(Some(1), Some(4)), record(Some(10), Some(20))],
            0,
        );

        let slices = stager.seal().unwrap();
        assert_eq!(slices[0].header.reference_md5, None);
    }

    #[test]
    fn test_seal_leaves_no_md5_for_unmapped_slice() {
        let mut stager = SliceStager::new(FixedProvider(Vec::new()));
        stager.stage(ReferenceContext::Unmapped, vec![record(None, None)], 0);

        let slices = stager.seal().unwrap();
        assert_eq!(slices[0].header.reference_md5, None);
        assert_eq!(slices[0].header.alignment_start, 0);
        assert_eq!(slices[0].header.alignment_span, 0);
    }

    #[test]
    fn test_seal_clears_staged_state() {
        let mut stager = SliceStager::new(FixedProvider(b"acgt".to_vec()));
        stager.stage(ReferenceContext::SingleRef(0), vec![record(Some(1), Some(4))], 0);
        stager.seal().unwrap();

        assert_eq!(stager.staged_slice_count(), 0);
    }

    #[test]
    fn test_digest_is_case_and_whitespace_insensitive() {
        assert_eq!(
            normalized_sequence_digest(b"acgt"),
            normalized_sequence_digest(b"ACGT")
        );
        assert_eq!(
            normalized_sequence_digest(b"ac gt\n"),
            normalized_sequence_digest(b"ACGT")
        );
    }
}

//! The slice/container partitioning policy (§4.1).
//!
//! [`SlicePartitioner`] decides, record by record, whether the record being
//! admitted can continue widening the current slice's reference context or
//! whether the current slice must be flushed (staged, and a fresh slice
//! started) first. It owns the slice-local accumulated record count and the
//! pipeline's monotonically increasing global record counter (§9 "Global
//! counter").

use crate::{
    error::{Error, StateError},
    reference_context::ReferenceContext,
};

/// The default per-slice record cap, chosen to match the teacher stack's
/// per-container default (`DEFAULT_RECORDS_PER_SLICE` in the block-codec
/// writer options this crate's slices ultimately feed).
pub const DEFAULT_MAX_RECORDS_PER_SLICE: usize = 10_240;

/// The default floor below which a single-reference tail is folded into a
/// multi-reference slice rather than left to stand alone (§4.1
/// "Rationale").
pub const DEFAULT_MIN_SINGLE_REF_SLICE_THRESHOLD: usize = 1_000;

/// Tunable thresholds for [`SlicePartitioner`] (§4.1 "configuration").
#[derive(Clone, Copy, Debug)]
pub struct PartitionerConfig {
    /// `M`: the maximum number of records a slice may accumulate before it
    /// is flushed.
    pub max_records_per_slice: usize,
    /// `T`: the minimum record count a lone single-reference (or small
    /// multi-reference) tail slice must reach before it is flushed rather
    /// than folded into a wider context.
    pub min_single_ref_slice_threshold: usize,
    /// Whether the input stream is coordinate-sorted. Gates the
    /// unmapped-then-mapped fatal transition and the `MultiRef` small-tail
    /// flush rule.
    pub coordinate_sorted: bool,
}

impl Default for PartitionerConfig {
    fn default() -> Self {
        Self {
            max_records_per_slice: DEFAULT_MAX_RECORDS_PER_SLICE,
            min_single_ref_slice_threshold: DEFAULT_MIN_SINGLE_REF_SLICE_THRESHOLD,
            coordinate_sorted: true,
        }
    }
}

/// The outcome of [`SlicePartitioner::process`] for one incoming record
/// (§4.1 "Output").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Directive {
    /// The record is admitted; the slice's reference context widens (or
    /// stays) to the given context.
    Continue(ReferenceContext),
    /// The current slice must be flushed (staged by the caller) before
    /// this record can be considered again.
    Flush,
}

/// A state machine deciding when to emit a slice (§4.1).
///
/// Not safe for concurrent mutation (§5): a partitioner is owned by the one
/// writer that feeds it records in order.
#[derive(Clone, Debug)]
pub struct SlicePartitioner {
    config: PartitionerConfig,
    current_context: ReferenceContext,
    accumulated_record_count: usize,
    global_record_counter: u64,
}

impl SlicePartitioner {
    /// Creates a partitioner with no records accumulated.
    pub fn new(config: PartitionerConfig) -> Self {
        Self {
            config,
            current_context: ReferenceContext::Uninitialized,
            accumulated_record_count: 0,
            global_record_counter: 0,
        }
    }

    /// The reference context of the slice currently being accumulated.
    pub fn current_context(&self) -> ReferenceContext {
        self.current_context
    }

    /// The number of records accumulated into the current slice.
    pub fn accumulated_record_count(&self) -> usize {
        self.accumulated_record_count
    }

    /// The pipeline-wide record counter (§9 "Global counter"): the total
    /// number of records admitted across the lifetime of this partitioner,
    /// never reset by a flush.
    pub fn global_record_counter(&self) -> u64 {
        self.global_record_counter
    }

    /// Evaluates and applies the transition table (§4.1) for a record
    /// whose reference sequence id is `next_reference_index` (`None` for
    /// unmapped), given that `staged_slice_count` slices are already
    /// staged in the current container.
    ///
    /// On [`Directive::Continue`], the record is considered admitted: the
    /// context and record counts update immediately. On
    /// [`Directive::Flush`], nothing is admitted; the caller must stage
    /// the current slice and then call `process` again with the same
    /// record to get its admitting `Continue`.
    pub fn process(
        &mut self,
        next_reference_index: Option<usize>,
        staged_slice_count: usize,
    ) -> Result<Directive, Error> {
        let directive = self.decide(next_reference_index, staged_slice_count)?;

        match directive {
            Directive::Continue(ctx) => {
                self.current_context = ctx;
                self.accumulated_record_count += 1;
                self.global_record_counter += 1;
            }
            Directive::Flush => {
                self.current_context = ReferenceContext::Uninitialized;
                self.accumulated_record_count = 0;
            }
        }

        Ok(directive)
    }

    fn decide(
        &self,
        next_reference_index: Option<usize>,
        staged_slice_count: usize,
    ) -> Result<Directive, Error> {
        let r = self.accumulated_record_count;
        let m = self.config.max_records_per_slice;
        let t = self.config.min_single_ref_slice_threshold;
        let coordinate_sorted = self.config.coordinate_sorted;

        match self.current_context {
            ReferenceContext::Uninitialized => {
                if r != 0 {
                    return Err(StateError::UninitializedWithRecords.into());
                }

                Ok(Directive::Continue(
                    ReferenceContext::Uninitialized.merge(next_reference_index),
                ))
            }
            ReferenceContext::Unmapped => match next_reference_index {
                None => Ok(continue_or_flush(ReferenceContext::Unmapped, r, m)),
                Some(_) if coordinate_sorted => {
                    Err(crate::error::PolicyError::MappedAfterUnmapped.into())
                }
                Some(id) => {
                    if r < m {
                        Ok(Directive::Continue(ReferenceContext::Unmapped.merge(Some(id))))
                    } else {
                        Ok(Directive::Flush)
                    }
                }
            },
            ReferenceContext::MultiRef => {
                if coordinate_sorted {
                    if r >= t {
                        Ok(Directive::Flush)
                    } else {
                        Ok(Directive::Continue(ReferenceContext::MultiRef))
                    }
                } else {
                    Ok(continue_or_flush(ReferenceContext::MultiRef, r, m))
                }
            }
            ReferenceContext::SingleRef(x) => match next_reference_index {
                Some(id) if id == x => Ok(continue_or_flush(ReferenceContext::SingleRef(x), r, m)),
                _ => {
                    if r >= t {
                        Ok(Directive::Flush)
                    } else if staged_slice_count > 0 {
                        Ok(Directive::Flush)
                    } else {
                        Ok(Directive::Continue(
                            ReferenceContext::SingleRef(x).merge(next_reference_index),
                        ))
                    }
                }
            },
        }
    }
}

fn continue_or_flush(context: ReferenceContext, r: usize, m: usize) -> Directive {
    if r < m {
        Directive::Continue(context)
    } else {
        Directive::Flush
    }
}

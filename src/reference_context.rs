use std::cmp;

/// The reference-sequence tag a slice or container carries (§3).
///
/// A small closed sum type: four variants, one payload on one variant.
/// Deliberately represented as a tagged value rather than a class hierarchy
/// (§9 "Tagged contexts vs inheritance"); the serializable id is derived by
/// [`ReferenceContext::serializable_id`], a pure function of the variant.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReferenceContext {
    /// No record has been admitted yet. Never serialized; any attempt to
    /// serialize it is a programmer error.
    #[default]
    Uninitialized,
    /// All admitted records align to the one reference sequence `id`.
    SingleRef(usize),
    /// Admitted records span more than one reference sequence. Never
    /// appears in an emitted [`crate::IndexEntry`] (§3 invariant).
    MultiRef,
    /// All admitted records are unmapped and unplaced.
    Unmapped,
}

impl ReferenceContext {
    /// The serializable id used on the wire: the reference id for
    /// `SingleRef`, −2 for `MultiRef`, −1 for `Unmapped`.
    ///
    /// `Uninitialized` has no wire representation; callers must not reach
    /// this point with it still uninitialized.
    pub fn serializable_id(&self) -> Option<i32> {
        match *self {
            Self::Uninitialized => None,
            Self::SingleRef(id) => i32::try_from(id).ok(),
            Self::MultiRef => Some(-2),
            Self::Unmapped => Some(-1),
        }
    }

    /// Returns `true` for `MultiRef`.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::MultiRef)
    }

    /// Returns `true` for `Unmapped`.
    pub fn is_unmapped(&self) -> bool {
        matches!(self, Self::Unmapped)
    }

    /// Folds the next record's reference id into this context, widening
    /// `SingleRef` to `MultiRef` on a mismatch. Mirrors the
    /// container/slice reference-context merge used when assembling a
    /// multi-slice container.
    pub fn merge(self, other_reference_sequence_id: Option<usize>) -> Self {
        match (self, other_reference_sequence_id) {
            (Self::Uninitialized, Some(id)) => Self::SingleRef(id),
            (Self::Uninitialized, None) => Self::Unmapped,
            (Self::SingleRef(a), Some(b)) if a == b => Self::SingleRef(a),
            (Self::SingleRef(_), _) => Self::MultiRef,
            (Self::Unmapped, None) => Self::Unmapped,
            (Self::Unmapped, Some(_)) => Self::MultiRef,
            (Self::MultiRef, _) => Self::MultiRef,
        }
    }

    /// Orders contexts the way [`crate::IndexEntry`] orders reference ids:
    /// `Unmapped` sorts last, `MultiRef`/`Uninitialized` are not
    /// comparable here and are ordered arbitrarily (they never reach an
    /// index entry).
    pub(crate) fn index_ordering_key(&self) -> (u8, usize) {
        match *self {
            Self::SingleRef(id) => (0, id),
            Self::MultiRef => (1, 0),
            Self::Uninitialized => (1, 0),
            Self::Unmapped => (2, 0),
        }
    }
}

impl cmp::PartialOrd for ReferenceContext {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl cmp::Ord for ReferenceContext {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.index_ordering_key().cmp(&other.index_ordering_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializable_id() {
        assert_eq!(ReferenceContext::Uninitialized.serializable_id(), None);
        assert_eq!(ReferenceContext::SingleRef(0).serializable_id(), Some(0));
        assert_eq!(ReferenceContext::SingleRef(5).serializable_id(), Some(5));
        assert_eq!(ReferenceContext::MultiRef.serializable_id(), Some(-2));
        assert_eq!(ReferenceContext::Unmapped.serializable_id(), Some(-1));
    }

    #[test]
    fn test_merge_widens_to_multi_ref() {
        let ctx = ReferenceContext::Uninitialized.merge(Some(0));
        assert_eq!(ctx, ReferenceContext::SingleRef(0));

        let ctx = ctx.merge(Some(1));
        assert_eq!(ctx, ReferenceContext::MultiRef);

        // MultiRef is sticky.
        let ctx = ctx.merge(Some(0));
        assert_eq!(ctx, ReferenceContext::MultiRef);
    }

    #[test]
    fn test_merge_unmapped() {
        let ctx = ReferenceContext::Uninitialized.merge(None);
        assert_eq!(ctx, ReferenceContext::Unmapped);
        assert_eq!(ctx.merge(None), ReferenceContext::Unmapped);
        assert_eq!(ctx.merge(Some(0)), ReferenceContext::MultiRef);
    }

    #[test]
    fn test_ordering_unmapped_last() {
        let mut contexts = vec![
            ReferenceContext::Unmapped,
            ReferenceContext::SingleRef(3),
            ReferenceContext::SingleRef(1),
        ];
        contexts.sort();

        assert_eq!(
            contexts,
            vec![
                ReferenceContext::SingleRef(1),
                ReferenceContext::SingleRef(3),
                ReferenceContext::Unmapped,
            ]
        );
    }
}

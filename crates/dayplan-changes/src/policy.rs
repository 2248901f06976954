//! Merge policies per change kind
//!
//! Every [`ChangeKind`] maps to exactly one [`MergePolicy`]; the match is
//! exhaustive so a new kind cannot be added without choosing its policy.

use crate::change::ChangeKind;

/// How repeated edits of one kind combine in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergePolicy {
    /// At most one record of the kind; dropped when the draft equals the
    /// baseline again
    CurrentValue,

    /// At most one record per (kind, stop id); re-submitting toggles it off
    ItemKeyed,

    /// Every submission appends, nothing collapses
    AppendOnly,
}

impl MergePolicy {
    /// Policy for a change kind
    #[must_use]
    pub fn for_kind(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::UpdateSettings | ChangeKind::SetPreset => Self::CurrentValue,
            ChangeKind::MarkReplacePoi | ChangeKind::RemovePoi => Self::ItemKeyed,
            ChangeKind::AddPoi | ChangeKind::AddWish => Self::AppendOnly,
        }
    }

    /// Whether the policy ever removes earlier records
    #[inline]
    #[must_use]
    pub fn deduplicates(&self) -> bool {
        matches!(self, Self::CurrentValue | Self::ItemKeyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_value_kinds() {
        assert_eq!(
            MergePolicy::for_kind(ChangeKind::UpdateSettings),
            MergePolicy::CurrentValue
        );
        assert_eq!(MergePolicy::for_kind(ChangeKind::SetPreset), MergePolicy::CurrentValue);
    }

    #[test]
    fn item_keyed_kinds() {
        assert_eq!(MergePolicy::for_kind(ChangeKind::MarkReplacePoi), MergePolicy::ItemKeyed);
        assert_eq!(MergePolicy::for_kind(ChangeKind::RemovePoi), MergePolicy::ItemKeyed);
    }

    #[test]
    fn append_only_kinds_never_deduplicate() {
        for kind in [ChangeKind::AddPoi, ChangeKind::AddWish] {
            let policy = MergePolicy::for_kind(kind);
            assert_eq!(policy, MergePolicy::AppendOnly);
            assert!(!policy.deduplicates());
        }
    }
}

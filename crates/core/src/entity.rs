//! Identity for stored domain objects.

/// A domain object whose identity survives every change to its state.
///
/// Two values with the same id are the same entity, even if their fields differ
/// (for example before and after an update, or after a retire).
pub trait Entity {
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;

    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

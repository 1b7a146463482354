use std::fmt;

use slotmap::new_key_type;

new_key_type! {
    /// Generational arena slot key, private to the view internals.
    pub(crate) struct NodeKey;
}

/// Opaque identifier for an element stored in a view arena.
///
/// An id carries the identity of the view that created it, so an id minted
/// by one view never resolves against another, even when the underlying
/// arena slots coincide. Slots are generational: an id held after its
/// element is removed will no longer resolve, which is how non-owning
/// back-references (such as a container's last-focused element) invalidate
/// themselves.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// Identity of the owning view.
    pub(crate) view: u64,
    /// Arena slot within that view.
    pub(crate) key: NodeKey,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}/{:?})", self.view, self.key)
    }
}

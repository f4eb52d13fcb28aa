use crate::address::AddressSet;

/// The endpoints that must be added to and removed from a client's view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diff {
    pub add: AddressSet,
    pub remove: AddressSet,
}

/// Computes the changes needed to move a client from `snapshot` to `filtered`.
///
/// Both halves of the diff carry the labels of `filtered`.
pub fn diff(filtered: &AddressSet, snapshot: &AddressSet) -> Diff {
    let add = filtered
        .addresses
        .iter()
        .filter(|(id, _)| !snapshot.contains(id))
        .map(|(id, ep)| (id.clone(), ep.clone()))
        .collect::<AddressSet>()
        .with_labels(filtered.labels.clone());

    let remove = snapshot
        .addresses
        .iter()
        .filter(|(id, _)| !filtered.contains(id))
        .map(|(id, ep)| (id.clone(), ep.clone()))
        .collect::<AddressSet>()
        .with_labels(filtered.labels.clone());

    Diff { add, remove }
}

impl Diff {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

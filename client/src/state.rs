use std::collections::{hash_map::Entry, HashMap};

use penne_shared::{Identifier, Specifier};

use crate::{delegate::Delegate, error::DispatchError};

// StateStore
/// Authoritative local mirror of the server's shared state.
///
/// The document is a singleton that lives for the whole session. Every other
/// specifier maps object index -> delegate. Entries enter only through a
/// create message and leave only through a delete message.
pub struct StateStore {
    document: Box<dyn Delegate>,
    compartments: HashMap<Specifier, HashMap<u32, Box<dyn Delegate>>>,
}

impl StateStore {
    pub fn new(document: Box<dyn Delegate>) -> Self {
        let compartments = Specifier::ALL
            .into_iter()
            .filter(|specifier| !specifier.is_document())
            .map(|specifier| (specifier, HashMap::new()))
            .collect();
        Self {
            document,
            compartments,
        }
    }

    pub fn document(&self) -> &dyn Delegate {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> &mut (dyn Delegate + 'static) {
        self.document.as_mut()
    }

    /// For the document, `index` is ignored
    pub fn get(&self, specifier: Specifier, index: u32) -> Option<&dyn Delegate> {
        if specifier.is_document() {
            return Some(self.document());
        }
        self.compartments
            .get(&specifier)?
            .get(&index)
            .map(|delegate| delegate.as_ref())
    }

    /// For the document, `index` is ignored
    pub fn get_mut(&mut self, specifier: Specifier, index: u32) -> Option<&mut (dyn Delegate + 'static)> {
        if specifier.is_document() {
            return Some(self.document.as_mut());
        }
        self.compartments
            .get_mut(&specifier)?
            .get_mut(&index)
            .map(|delegate| delegate.as_mut())
    }

    /// Downcasts the delegate at `specifier[index]` to its concrete type
    pub fn get_as<D: Delegate>(&self, specifier: Specifier, index: u32) -> Option<&D> {
        self.get(specifier, index)?.as_any().downcast_ref::<D>()
    }

    pub fn get_as_mut<D: Delegate>(&mut self, specifier: Specifier, index: u32) -> Option<&mut D> {
        self.get_mut(specifier, index)?.as_any_mut().downcast_mut::<D>()
    }

    pub fn contains(&self, specifier: Specifier, index: u32) -> bool {
        self.get(specifier, index).is_some()
    }

    /// Current identifier of the delegate at `specifier[index]`
    pub fn identifier(&self, specifier: Specifier, index: u32) -> Option<Identifier> {
        self.get(specifier, index).map(|delegate| delegate.info().id)
    }

    /// Delegates of one compartment, in no particular order. Empty for the
    /// document.
    pub fn iter(&self, specifier: Specifier) -> impl Iterator<Item = (u32, &dyn Delegate)> {
        self.compartments
            .get(&specifier)
            .into_iter()
            .flat_map(|compartment| compartment.iter())
            .map(|(index, delegate)| (*index, delegate.as_ref()))
    }

    /// Number of delegates in a compartment, the document counts as one
    pub fn len(&self, specifier: Specifier) -> usize {
        if specifier.is_document() {
            return 1;
        }
        self.compartments
            .get(&specifier)
            .map_or(0, |compartment| compartment.len())
    }

    /// Delegates outside the document
    pub fn total_len(&self) -> usize {
        self.compartments.values().map(HashMap::len).sum()
    }

    /// First delegate of a compartment whose `info.name` equals `name`
    pub fn find_by_name(&self, specifier: Specifier, name: &str) -> Option<&dyn Delegate> {
        self.iter(specifier)
            .map(|(_, delegate)| delegate)
            .find(|delegate| delegate.info().name.as_deref() == Some(name))
    }

    /// Stores `delegate` under the index of `id`, the identifier carried by
    /// the create message, and returns the stored entry. Fails if a live
    /// delegate already occupies the slot. The store is left untouched on
    /// failure.
    pub(crate) fn insert(
        &mut self,
        specifier: Specifier,
        id: Identifier,
        delegate: Box<dyn Delegate>,
    ) -> Result<&mut (dyn Delegate + 'static), DispatchError> {
        if specifier.is_document() {
            return Err(DispatchError::DelegateAlreadyExists {
                specifier,
                existing: self.document.info().id,
                incoming: id,
            });
        }

        let compartment = self
            .compartments
            .get_mut(&specifier)
            .ok_or(DispatchError::UnknownSpecifier { specifier })?;
        match compartment.entry(id.index()) {
            Entry::Occupied(existing) => Err(DispatchError::DelegateAlreadyExists {
                specifier,
                existing: existing.get().info().id,
                incoming: id,
            }),
            Entry::Vacant(slot) => Ok(slot.insert(delegate).as_mut()),
        }
    }

    pub(crate) fn remove(&mut self, specifier: Specifier, index: u32) -> Option<Box<dyn Delegate>> {
        self.compartments.get_mut(&specifier)?.remove(&index)
    }
}

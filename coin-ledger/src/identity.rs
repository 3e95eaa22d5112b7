//! Registry of identities recognised by admission control

use crate::crypto::validate_public_key;
use crate::types::Identity;
use crate::Result;
use std::collections::{BTreeMap, HashMap};

/// Labelled set of known identities
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    by_label: BTreeMap<String, Identity>,

    /// Reverse index, kept in step with `by_label`
    by_identity: HashMap<Identity, String>,
}

impl IdentityRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `identity` under `label`
    ///
    /// Labels and keys pair one to one: a label gets the new key and a key
    /// moves off any label it held before.
    pub fn register(&mut self, label: impl Into<String>, identity: Identity) -> Result<()> {
        validate_public_key(&identity)?;
        let label = label.into();

        if let Some(previous) = self.by_label.insert(label.clone(), identity) {
            if previous != identity {
                tracing::warn!(%label, old = %previous.short(), new = %identity.short(), "Identity key replaced");
                self.by_identity.remove(&previous);
            }
        } else {
            tracing::debug!(%label, identity = %identity.short(), "Identity registered");
        }

        // A key moving to a new label leaves its old label behind
        if let Some(old_label) = self.by_identity.insert(identity, label.clone()) {
            if old_label != label {
                self.by_label.remove(&old_label);
            }
        }

        Ok(())
    }

    /// Known identity?
    pub fn contains(&self, identity: &Identity) -> bool {
        self.by_identity.contains_key(identity)
    }

    /// Identity registered under `label`
    pub fn lookup(&self, label: &str) -> Option<Identity> {
        self.by_label.get(label).copied()
    }

    /// Label for `identity`
    pub fn label_of(&self, identity: &Identity) -> Option<&str> {
        self.by_identity.get(identity).map(String::as_str)
    }

    /// Number of registered labels
    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    /// No identities registered
    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    /// `(label, identity)` pairs in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Identity)> {
        self.by_label.iter().map(|(label, id)| (label.as_str(), *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_register_and_lookup() {
        let alice = KeyPair::development("Alice").identity();
        let mut registry = IdentityRegistry::new();
        registry.register("Alice", alice).unwrap();

        assert!(registry.contains(&alice));
        assert_eq!(registry.lookup("Alice"), Some(alice));
        assert_eq!(registry.label_of(&alice), Some("Alice"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregister_replaces_key() {
        let old = KeyPair::generate().identity();
        let new = KeyPair::generate().identity();
        let mut registry = IdentityRegistry::new();
        registry.register("Carol", old).unwrap();
        registry.register("Carol", new).unwrap();

        assert!(!registry.contains(&old));
        assert!(registry.contains(&new));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_key_moved_to_new_label() {
        let dave = KeyPair::generate().identity();
        let mut registry = IdentityRegistry::new();
        registry.register("Dave", dave).unwrap();
        registry.register("David", dave).unwrap();

        assert_eq!(registry.label_of(&dave), Some("David"));
        assert_eq!(registry.lookup("Dave"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregister_clears_reverse_index() {
        let old = KeyPair::generate().identity();
        let new = KeyPair::generate().identity();
        let mut registry = IdentityRegistry::new();
        registry.register("Carol", old).unwrap();
        registry.register("Carol", new).unwrap();

        assert_eq!(registry.label_of(&old), None);
        assert_eq!(registry.label_of(&new), Some("Carol"));
    }

    #[test]
    fn test_unknown_identity() {
        let registry = IdentityRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains(&KeyPair::generate().identity()));
        assert_eq!(registry.lookup("Nobody"), None);
    }
}

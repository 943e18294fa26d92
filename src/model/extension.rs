//! Extension Slot Manager (component D).

use super::value::ExtensionTypeHint;
use crate::config::ExtensionPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Binds a user-declared extra slot's name to its property IRI and type hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDefinition {
    /// Local slot name, e.g. `ext_my_score`.
    pub slot_name: String,
    /// The property IRI this slot's values are asserted against.
    pub property_iri: String,
    /// Declared type of the slot's values.
    #[serde(skip)]
    pub type_hint: ExtensionTypeHint,
    /// The type hint's IRI form, as written in `extension_definitions`.
    pub type_hint_iri: String,
}

/// A valid extension slot name: `[A-Za-z_][A-Za-z0-9_]*`, and not one of the
/// standard slot names.
#[must_use]
pub fn is_valid_extension_name(name: &str, standard_names: &[&str]) -> bool {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    first_ok && rest_ok && !standard_names.contains(&name)
}

/// Tracks user-declared extension definitions and recognises extension
/// fields on read according to the configured [`ExtensionPolicy`].
#[derive(Debug, Clone, Default)]
pub struct ExtensionSlotManager {
    by_property_iri: HashMap<String, ExtensionDefinition>,
    by_slot_name: HashMap<String, ExtensionDefinition>,
}

impl ExtensionSlotManager {
    /// Build a manager from a set's declared `extension_definitions`.
    #[must_use]
    pub fn new(definitions: Vec<ExtensionDefinition>) -> Self {
        let mut mgr = Self::default();
        for def in definitions {
            mgr.declare(def);
        }
        mgr
    }

    /// Register a definition, indexing it by both property IRI and slot name.
    pub fn declare(&mut self, def: ExtensionDefinition) {
        self.by_property_iri.insert(def.property_iri.clone(), def.clone());
        self.by_slot_name.insert(def.slot_name.clone(), def);
    }

    /// Look up a definition by its local slot name.
    #[must_use]
    pub fn by_slot_name(&self, slot_name: &str) -> Option<&ExtensionDefinition> {
        self.by_slot_name.get(slot_name)
    }

    /// Look up a definition by its property IRI.
    #[must_use]
    pub fn by_property_iri(&self, property_iri: &str) -> Option<&ExtensionDefinition> {
        self.by_property_iri.get(property_iri)
    }

    /// Decide whether a non-standard field encountered while reading should
    /// be accepted, and if so, under which definition.
    ///
    /// `UNDEFINED` synthesises a definition for any syntactically valid
    /// extension name that wasn't already declared, inferring its property
    /// IRI from the slot name (`https://w3id.org/sssom/ext/<name>`) and
    /// defaulting its type hint to `xsd:string`.
    pub fn resolve_on_read(
        &mut self,
        field_name: &str,
        policy: ExtensionPolicy,
        standard_names: &[&str],
    ) -> Option<ExtensionDefinition> {
        match policy {
            ExtensionPolicy::None => None,
            ExtensionPolicy::Defined => self.by_slot_name(field_name).cloned(),
            ExtensionPolicy::Undefined => {
                if let Some(def) = self.by_slot_name(field_name) {
                    return Some(def.clone());
                }
                if !is_valid_extension_name(field_name, standard_names) {
                    return None;
                }
                let def = ExtensionDefinition {
                    slot_name: field_name.to_string(),
                    property_iri: format!("https://w3id.org/sssom/ext/{field_name}"),
                    type_hint: ExtensionTypeHint::String,
                    type_hint_iri: "xsd:string".to_string(),
                };
                self.declare(def.clone());
                Some(def)
            }
        }
    }

    /// All currently-known definitions, in insertion order, for emission in
    /// the `extension_definitions` block on write.
    #[must_use]
    pub fn definitions(&self) -> Vec<ExtensionDefinition> {
        self.by_slot_name.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_names_colliding_with_standard_slots() {
        assert!(!is_valid_extension_name("subject_id", &["subject_id"]));
        assert!(is_valid_extension_name("ext_my_score", &["subject_id"]));
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(!is_valid_extension_name("1bad", &[]));
        assert!(!is_valid_extension_name("bad-name", &[]));
        assert!(is_valid_extension_name("_ok_name1", &[]));
    }

    #[test]
    fn undefined_policy_synthesises_a_definition() {
        let mut mgr = ExtensionSlotManager::default();
        let def = mgr
            .resolve_on_read("ext_score", ExtensionPolicy::Undefined, &["subject_id"])
            .expect("synthesised definition");
        assert_eq!(def.property_iri, "https://w3id.org/sssom/ext/ext_score");
        assert!(mgr.by_slot_name("ext_score").is_some());
    }

    #[test]
    fn defined_policy_rejects_unknown_fields() {
        let mut mgr = ExtensionSlotManager::default();
        assert!(mgr
            .resolve_on_read("ext_score", ExtensionPolicy::Defined, &["subject_id"])
            .is_none());
    }

    #[test]
    fn none_policy_drops_everything() {
        let mut mgr = ExtensionSlotManager::default();
        mgr.declare(ExtensionDefinition {
            slot_name: "ext_score".to_string(),
            property_iri: "https://example.org/score".to_string(),
            type_hint: ExtensionTypeHint::Double,
            type_hint_iri: "xsd:double".to_string(),
        });
        assert!(mgr
            .resolve_on_read("ext_score", ExtensionPolicy::None, &[])
            .is_none());
    }
}

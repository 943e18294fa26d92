//! The slot descriptor type (component C).

use super::value::SlotValue;

/// Which entity a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// A [`crate::model::mapping_set::MappingSet`].
    MappingSet,
    /// A [`crate::model::mapping::Mapping`].
    Mapping,
}

/// The declared value type of a slot, used to pick the right branch of
/// [`SlotValue`] and to drive parsing/formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// A single string.
    String,
    /// A `|`-joined list of strings.
    ListOfString,
    /// A closed enumeration, stored by wire-form string.
    Enum,
    /// A bounded double.
    Double,
    /// A civil date.
    Date,
    /// A free-form string map.
    Map,
    /// The extension-definition list (mapping set only).
    ExtensionDefinitionList,
    /// The property-IRI-keyed extension value map.
    ExtensionValueMap,
}

/// A descriptor for one field of entity `T`.
///
/// `get`/`set` are plain function pointers rather than closures: no slot
/// needs captured state, and a pointer keeps [`Slot`] `Copy`-free but cheap
/// to hold in a `'static` registry.
pub struct Slot<T> {
    /// Lowercase snake_case slot name.
    pub name: &'static str,
    /// Declared value type.
    pub value_type: ValueType,
    /// Whether this slot's set-level value propagates down to mappings.
    pub propagatable: bool,
    /// Whether the value is an IRI that may be shortened to a CURIE.
    pub entity_reference: bool,
    /// Whether the value is an absolute IRI that must *not* be shortened.
    pub uri_typed: bool,
    /// SSSOM schema version this slot was introduced in, e.g. `"1.0"`.
    pub version_introduced: &'static str,
    /// Read the slot's current value, or `None` if absent.
    pub get: fn(&T) -> Option<SlotValue>,
    /// Write a new value to the slot, or clear it when `None`.
    ///
    /// # Errors
    /// Returns an error message when the mandatory-ID invariant is violated
    /// or the value's dynamic type mismatches [`Slot::value_type`].
    pub set: fn(&mut T, Option<SlotValue>) -> Result<(), String>,
}

/// A closed, exhaustive visitor over a slot's value, dispatched without any
/// string-based branching (Design Notes §9).
pub trait SlotVisitor {
    /// Called once per slot whose value is present, in declaration order.
    fn visit(&mut self, slot_name: &'static str, value: &SlotValue);
}

/// A name-based subset selector, used by [`crate::model::registry::visit_mapping_slots`]
/// and by [`crate::pipeline::TagSelection`] for rule-tag admission.
#[derive(Debug, Clone)]
pub enum NameFilter {
    /// Only the named slots pass.
    IncludeOnly(Vec<String>),
    /// Every slot except the named ones passes.
    Exclude(Vec<String>),
    /// Every slot passes.
    All,
}

impl NameFilter {
    /// Whether `name` passes this filter.
    #[must_use]
    pub fn admits(&self, name: &str) -> bool {
        match self {
            Self::IncludeOnly(names) => names.iter().any(|n| n == name),
            Self::Exclude(names) => !names.iter().any(|n| n == name),
            Self::All => true,
        }
    }
}

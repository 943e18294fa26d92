//! The SSSOM data model: slots, values, mappings, and mapping sets.

pub mod extension;
pub mod mapping;
pub mod mapping_set;
pub mod registry;
pub mod slot;
pub mod value;

pub use mapping::{Mapping, MappingBuilder, PropagatableSlot};
pub use mapping_set::{MappingSet, MappingSetCollection, PrefixMap};
pub use slot::{EntityType, NameFilter, Slot, SlotVisitor, ValueType};
pub use value::{Cardinality, ExtensionTypeHint, ExtensionValue, PredicateModifier, SlotValue};

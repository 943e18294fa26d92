//! The process-wide slot metamodel registry (component C).
//!
//! Built once, at first use, via `once_cell::sync::Lazy` — a read-mostly
//! global table, per Design Notes §9 ("builtin prefixes and slot registry
//! are process-global read-mostly tables; initialise once at startup and
//! treat as immutable").

use super::mapping::Mapping;
use super::slot::{NameFilter, Slot, SlotVisitor, ValueType};
use super::value::SlotValue;
use once_cell::sync::Lazy;

macro_rules! opt_str_slot {
    ($name:literal, $field:ident, $propagatable:literal, $entity_ref:literal, $uri:literal, $version:literal) => {
        Slot {
            name: $name,
            value_type: ValueType::String,
            propagatable: $propagatable,
            entity_reference: $entity_ref,
            uri_typed: $uri,
            version_introduced: $version,
            get: |m: &Mapping| m.$field.clone().map(SlotValue::Str),
            set: |m: &mut Mapping, v: Option<SlotValue>| match v {
                None => {
                    m.$field = None;
                    Ok(())
                }
                Some(SlotValue::Str(s)) if s.is_empty() => {
                    m.$field = None;
                    Ok(())
                }
                Some(SlotValue::Str(s)) => {
                    m.$field = Some(s);
                    Ok(())
                }
                Some(_) => Err(format!("{} expects a string value", $name)),
            },
        }
    };
}

macro_rules! list_slot {
    ($name:literal, $field:ident, $propagatable:literal, $entity_ref:literal) => {
        Slot {
            name: $name,
            value_type: ValueType::ListOfString,
            propagatable: $propagatable,
            entity_reference: $entity_ref,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m: &Mapping| {
                if m.$field.is_empty() {
                    None
                } else {
                    Some(SlotValue::StrList(m.$field.clone()))
                }
            },
            set: |m: &mut Mapping, v: Option<SlotValue>| match v {
                None => {
                    m.$field = Vec::new();
                    Ok(())
                }
                Some(SlotValue::StrList(l)) => {
                    m.$field = l;
                    Ok(())
                }
                Some(_) => Err(format!("{} expects a list value", $name)),
            },
        }
    };
}

/// All slots of [`Mapping`], in SSSOM schema declaration order. This order
/// is the TSV writer's column-ordering contract (§4.C "Ordering contract").
pub static MAPPING_SLOTS: Lazy<Vec<Slot<Mapping>>> = Lazy::new(|| {
    vec![
        Slot {
            name: "subject_id",
            value_type: ValueType::String,
            propagatable: false,
            entity_reference: true,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| Some(SlotValue::Str(m.subject_id.clone())),
            set: |m, v| match v {
                Some(SlotValue::Str(s)) if !s.is_empty() => {
                    m.subject_id = s;
                    Ok(())
                }
                _ => Err("subject_id is mandatory and cannot be cleared".to_string()),
            },
        },
        opt_str_slot!("subject_label", subject_label, false, false, false, "1.0"),
        opt_str_slot!(
            "subject_category",
            subject_category,
            false,
            false,
            false,
            "1.0"
        ),
        opt_str_slot!("subject_source", subject_source, true, true, false, "1.0"),
        opt_str_slot!(
            "subject_source_version",
            subject_source_version,
            true,
            false,
            false,
            "1.0"
        ),
        Slot {
            name: "subject_type",
            value_type: ValueType::Enum,
            propagatable: true,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| m.subject_type.clone().map(SlotValue::Enum),
            set: |m, v| match v {
                None => {
                    m.subject_type = None;
                    Ok(())
                }
                Some(SlotValue::Enum(s)) => {
                    m.subject_type = Some(s);
                    Ok(())
                }
                _ => Err("subject_type expects an enum value".to_string()),
            },
        },
        list_slot!(
            "subject_match_field",
            subject_match_field,
            true,
            false
        ),
        list_slot!(
            "subject_preprocessing",
            subject_preprocessing,
            true,
            false
        ),
        Slot {
            name: "predicate_id",
            value_type: ValueType::String,
            propagatable: false,
            entity_reference: true,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| Some(SlotValue::Str(m.predicate_id.clone())),
            set: |m, v| match v {
                Some(SlotValue::Str(s)) if !s.is_empty() => {
                    m.predicate_id = s;
                    Ok(())
                }
                _ => Err("predicate_id is mandatory and cannot be cleared".to_string()),
            },
        },
        opt_str_slot!(
            "predicate_label",
            predicate_label,
            false,
            false,
            false,
            "1.0"
        ),
        Slot {
            name: "predicate_modifier",
            value_type: ValueType::Enum,
            propagatable: false,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| {
                m.predicate_modifier
                    .map(|pm| SlotValue::Enum(pm.as_str().to_string()))
            },
            set: |m, v| match v {
                None => {
                    m.predicate_modifier = None;
                    Ok(())
                }
                Some(SlotValue::Enum(s)) => {
                    m.predicate_modifier = super::value::PredicateModifier::parse(&s);
                    if m.predicate_modifier.is_none() {
                        return Err(format!("unknown predicate_modifier {s}"));
                    }
                    Ok(())
                }
                _ => Err("predicate_modifier expects an enum value".to_string()),
            },
        },
        Slot {
            name: "predicate_type",
            value_type: ValueType::Enum,
            propagatable: true,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| m.predicate_type.clone().map(SlotValue::Enum),
            set: |m, v| match v {
                None => {
                    m.predicate_type = None;
                    Ok(())
                }
                Some(SlotValue::Enum(s)) => {
                    m.predicate_type = Some(s);
                    Ok(())
                }
                _ => Err("predicate_type expects an enum value".to_string()),
            },
        },
        Slot {
            name: "object_id",
            value_type: ValueType::String,
            propagatable: false,
            entity_reference: true,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| Some(SlotValue::Str(m.object_id.clone())),
            set: |m, v| match v {
                Some(SlotValue::Str(s)) if !s.is_empty() => {
                    m.object_id = s;
                    Ok(())
                }
                _ => Err("object_id is mandatory and cannot be cleared".to_string()),
            },
        },
        opt_str_slot!("object_label", object_label, false, false, false, "1.0"),
        opt_str_slot!(
            "object_category",
            object_category,
            false,
            false,
            false,
            "1.0"
        ),
        opt_str_slot!("object_source", object_source, true, true, false, "1.0"),
        opt_str_slot!(
            "object_source_version",
            object_source_version,
            true,
            false,
            false,
            "1.0"
        ),
        Slot {
            name: "object_type",
            value_type: ValueType::Enum,
            propagatable: true,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| m.object_type.clone().map(SlotValue::Enum),
            set: |m, v| match v {
                None => {
                    m.object_type = None;
                    Ok(())
                }
                Some(SlotValue::Enum(s)) => {
                    m.object_type = Some(s);
                    Ok(())
                }
                _ => Err("object_type expects an enum value".to_string()),
            },
        },
        list_slot!("object_match_field", object_match_field, true, false),
        list_slot!("object_preprocessing", object_preprocessing, true, false),
        Slot {
            name: "mapping_justification",
            value_type: ValueType::String,
            propagatable: false,
            entity_reference: true,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| Some(SlotValue::Str(m.mapping_justification.clone())),
            set: |m, v| match v {
                Some(SlotValue::Str(s)) if !s.is_empty() => {
                    m.mapping_justification = s;
                    Ok(())
                }
                _ => Err("mapping_justification is mandatory and cannot be cleared".to_string()),
            },
        },
        list_slot!("author_id", author_id, false, true),
        list_slot!("author_label", author_label, false, false),
        list_slot!("reviewer_id", reviewer_id, false, true),
        list_slot!("reviewer_label", reviewer_label, false, false),
        list_slot!("creator_id", creator_id, false, true),
        list_slot!("creator_label", creator_label, false, false),
        Slot {
            name: "mapping_date",
            value_type: ValueType::Date,
            propagatable: true,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| m.mapping_date.map(SlotValue::Date),
            set: |m, v| match v {
                None => {
                    m.mapping_date = None;
                    Ok(())
                }
                Some(SlotValue::Date(d)) => {
                    m.mapping_date = Some(d);
                    Ok(())
                }
                _ => Err("mapping_date expects a date value".to_string()),
            },
        },
        Slot {
            name: "confidence",
            value_type: ValueType::Double,
            propagatable: false,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| m.confidence.map(SlotValue::Double),
            set: |m, v| match v {
                None => {
                    m.confidence = None;
                    Ok(())
                }
                Some(SlotValue::Double(d)) => m.set_confidence(d),
                _ => Err("confidence expects a double value".to_string()),
            },
        },
        Slot {
            name: "similarity_score",
            value_type: ValueType::Double,
            propagatable: false,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| m.similarity_score.map(SlotValue::Double),
            set: |m, v| match v {
                None => {
                    m.similarity_score = None;
                    Ok(())
                }
                Some(SlotValue::Double(d)) => m.set_similarity_score(d),
                _ => Err("similarity_score expects a double value".to_string()),
            },
        },
        opt_str_slot!(
            "similarity_measure",
            similarity_measure,
            true,
            false,
            false,
            "1.0"
        ),
        list_slot!("curation_rule", curation_rule, false, false),
        list_slot!("curation_rule_text", curation_rule_text, false, false),
        list_slot!("match_string", match_string, false, false),
        Slot {
            name: "mapping_cardinality",
            value_type: ValueType::Enum,
            propagatable: false,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| {
                m.mapping_cardinality
                    .map(|c| SlotValue::Enum(c.as_str().to_string()))
            },
            set: |m, v| match v {
                None => {
                    m.mapping_cardinality = None;
                    Ok(())
                }
                Some(SlotValue::Enum(s)) => {
                    m.mapping_cardinality = super::value::Cardinality::parse(&s);
                    if m.mapping_cardinality.is_none() {
                        return Err(format!("unknown mapping_cardinality {s}"));
                    }
                    Ok(())
                }
                _ => Err("mapping_cardinality expects an enum value".to_string()),
            },
        },
        opt_str_slot!("mapping_tool", mapping_tool, true, false, false, "1.0"),
        opt_str_slot!(
            "mapping_tool_version",
            mapping_tool_version,
            true,
            false,
            false,
            "1.0"
        ),
        opt_str_slot!(
            "mapping_provider",
            mapping_provider,
            true,
            true,
            false,
            "1.0"
        ),
        opt_str_slot!("comment", comment, false, false, false, "1.0"),
        list_slot!("see_also", see_also, false, false),
        Slot {
            name: "extension_values",
            value_type: ValueType::ExtensionValueMap,
            propagatable: false,
            entity_reference: false,
            uri_typed: false,
            version_introduced: "1.0",
            get: |m| {
                if m.extension_values.is_empty() {
                    None
                } else {
                    Some(SlotValue::ExtensionMap(m.extension_values.clone()))
                }
            },
            set: |m, v| match v {
                None => {
                    m.extension_values.clear();
                    Ok(())
                }
                Some(SlotValue::ExtensionMap(map)) => {
                    m.extension_values = map;
                    Ok(())
                }
                _ => Err("extension_values expects an extension map".to_string()),
            },
        },
    ]
});

/// Look up a [`Mapping`] slot descriptor by name.
#[must_use]
pub fn mapping_slot_by_name(name: &str) -> Option<&'static Slot<Mapping>> {
    MAPPING_SLOTS.iter().find(|s| s.name == name)
}

/// Visit every present slot of `mapping`, in declaration order.
pub fn visit_mapping_slots(mapping: &Mapping, visitor: &mut dyn SlotVisitor, filter: &NameFilter) {
    for slot in MAPPING_SLOTS.iter() {
        if !filter.admits(slot.name) {
            continue;
        }
        if let Some(value) = (slot.get)(mapping) {
            visitor.visit(slot.name, &value);
        }
    }
}

/// The standard (non-extension) slot names of [`Mapping`], used by the
/// extension-slot manager to reject name collisions.
#[must_use]
pub fn mapping_standard_slot_names() -> Vec<&'static str> {
    MAPPING_SLOTS.iter().map(|s| s.name).collect()
}

/// The set-level slots of [`MappingSet`] that are *not* mirrors of a
/// propagatable mapping slot, used for YAML front-matter ordering.
#[must_use]
pub fn mapping_set_header_slot_order() -> &'static [&'static str] {
    &[
        "mapping_set_id",
        "mapping_set_version",
        "mapping_set_confidence",
        "title",
        "description",
        "license",
        "publication_date",
        "curie_map",
        "extension_definitions",
    ]
}

/// Collector used to gather the union of populated slot names across a set
/// of mappings — the TSV writer's column-selection step (§4.F).
pub struct ColumnCollector {
    seen: indexmap::IndexSet<&'static str>,
}

impl Default for ColumnCollector {
    fn default() -> Self {
        Self {
            seen: indexmap::IndexSet::new(),
        }
    }
}

impl ColumnCollector {
    /// A fresh, empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the slots populated on one mapping.
    pub fn observe(&mut self, mapping: &Mapping) {
        for slot in MAPPING_SLOTS.iter() {
            if (slot.get)(mapping).is_some() {
                self.seen.insert(slot.name);
            }
        }
    }

    /// The observed slot names, in slot-declaration order (not insertion
    /// order), satisfying the Ordering contract of §4.C.
    #[must_use]
    pub fn columns(&self) -> Vec<&'static str> {
        MAPPING_SLOTS
            .iter()
            .map(|s| s.name)
            .filter(|name| self.seen.contains(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mapping::MappingBuilder;

    fn sample() -> Mapping {
        MappingBuilder::new()
            .subject_id("https://example.org/A")
            .predicate_id("http://www.w3.org/2004/02/skos/core#closeMatch")
            .object_id("https://example.org/B")
            .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
            .build()
            .unwrap()
    }

    #[test]
    fn slot_lookup_by_name_finds_subject_id() {
        let slot = mapping_slot_by_name("subject_id").expect("slot exists");
        assert!(slot.entity_reference);
        assert!(!slot.propagatable);
    }

    #[test]
    fn subject_id_cannot_be_cleared() {
        let slot = mapping_slot_by_name("subject_id").unwrap();
        let mut m = sample();
        let err = (slot.set)(&mut m, None).unwrap_err();
        assert!(err.contains("mandatory"));
    }

    #[test]
    fn visit_slots_follows_declaration_order() {
        let m = sample();
        struct Collect(Vec<&'static str>);
        impl SlotVisitor for Collect {
            fn visit(&mut self, name: &'static str, _value: &SlotValue) {
                self.0.push(name);
            }
        }
        let mut collector = Collect(Vec::new());
        visit_mapping_slots(&m, &mut collector, &NameFilter::All);
        let subj_idx = collector.0.iter().position(|n| *n == "subject_id").unwrap();
        let pred_idx = collector
            .0
            .iter()
            .position(|n| *n == "predicate_id")
            .unwrap();
        assert!(subj_idx < pred_idx);
    }

    #[test]
    fn column_collector_unions_across_mappings_in_declaration_order() {
        let mut m1 = sample();
        m1.comment = Some("note".to_string());
        let mut m2 = sample();
        m2.subject_label = Some("A".to_string());

        let mut collector = ColumnCollector::new();
        collector.observe(&m1);
        collector.observe(&m2);
        let cols = collector.columns();
        assert!(cols.contains(&"comment"));
        assert!(cols.contains(&"subject_label"));
        let label_idx = cols.iter().position(|c| *c == "subject_label").unwrap();
        let comment_idx = cols.iter().position(|c| *c == "comment").unwrap();
        assert!(label_idx < comment_idx);
    }

    #[test]
    fn include_only_filter_admits_named_slots() {
        let filter = NameFilter::IncludeOnly(vec!["subject_id".to_string()]);
        assert!(filter.admits("subject_id"));
        assert!(!filter.admits("object_id"));
    }

    #[test]
    fn exclude_filter_admits_everything_else() {
        let filter = NameFilter::Exclude(vec!["comment".to_string()]);
        assert!(!filter.admits("comment"));
        assert!(filter.admits("subject_id"));
    }
}

//! The `MappingSet` entity (component G) — the owning collection.

use super::extension::ExtensionDefinition;
use super::mapping::{get_propagatable, Mapping, PropagatableSlot};
use super::value::{ExtensionValue, SlotValue};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The default license a writer fills in when none was set (§4.F).
pub const DEFAULT_LICENSE: &str = "https://w3id.org/sssom/license/all-rights-reserved";

/// A short-name to IRI-prefix table, with unique keys and lookup by either
/// direction (component part of §3's "auxiliary data").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefixMap(IndexMap<String, String>);

impl PrefixMap {
    /// An empty prefix map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `short -> prefix`. A value of `"none"` removes
    /// the mapping instead, matching the prefix manager's `merge` rule.
    pub fn insert(&mut self, short: impl Into<String>, prefix: impl Into<String>) {
        let short = short.into();
        let prefix = prefix.into();
        if prefix == "none" {
            self.0.shift_remove(&short);
        } else {
            self.0.insert(short, prefix);
        }
    }

    /// Look up a short name's prefix.
    #[must_use]
    pub fn get(&self, short: &str) -> Option<&str> {
        self.0.get(short).map(String::as_str)
    }

    /// Look up the short name owning a given IRI prefix value, if any.
    #[must_use]
    pub fn short_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, v)| v.as_str() == prefix)
            .map(|(k, _)| k.as_str())
    }

    /// Iterate `(short, prefix)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A collection of [`Mapping`]s plus set-level metadata and auxiliary data.
///
/// The set owns its mappings: there is no mapping that outlives its set in
/// this model (Design Notes §9, "no cyclic owner/child required").
///
/// Unlike [`Mapping`], `MappingSet` is not `serde`-derived directly: the
/// wire representation is the YAML-front-matter-plus-TSV-body codec in
/// [`crate::tsv`], not a structural mirror of this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingSet {
    /// Human-readable title.
    pub title: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Version string of this set.
    pub mapping_set_version: Option<String>,
    /// Identifier for this set; synthesised by the writer if empty.
    pub mapping_set_id: String,
    /// License IRI; defaulted by the writer if empty.
    pub license: String,
    /// Date this set was published.
    pub publication_date: Option<NaiveDate>,
    /// Fallback confidence value for the set as a whole (metadata only; not
    /// auto-propagated — see `spec.md` §4.E's explicit propagatable list).
    pub mapping_set_confidence: Option<f64>,

    /// Propagatable mirrors of the per-mapping propagatable slots
    /// (§4.E), keyed by slot.
    pub propagatable: IndexMap<PropagatableSlot, SlotValue>,

    /// The ordered mappings this set owns.
    pub mappings: Vec<Mapping>,

    /// Short name -> IRI prefix.
    pub prefix_map: PrefixMap,
    /// User-declared extension definitions.
    pub extension_definitions: Vec<ExtensionDefinition>,
    /// Set-level extension values, keyed by property IRI.
    pub extension_values: IndexMap<String, ExtensionValue>,
}

impl MappingSet {
    /// An empty set with defaulted license/id left blank (filled by the
    /// writer's preconditions, §4.F).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a propagatable slot's set-level value.
    pub fn set_propagatable(&mut self, slot: PropagatableSlot, value: SlotValue) {
        self.propagatable.insert(slot, value);
    }

    /// Read a propagatable slot's set-level value.
    #[must_use]
    pub fn get_propagatable(&self, slot: PropagatableSlot) -> Option<&SlotValue> {
        self.propagatable.get(&slot)
    }

    /// Expand every propagatable set-level slot down to mappings whose slot
    /// is currently empty. Idempotent (§8).
    pub fn propagate(&mut self) {
        for slot in PropagatableSlot::all() {
            if let Some(value) = self.propagatable.get(slot).cloned() {
                for mapping in &mut self.mappings {
                    super::mapping::set_propagatable_if_empty(mapping, *slot, &value);
                }
            }
        }
    }

    /// Condense propagatable slots back up to the set level under the given
    /// policy. A no-op under `Disabled`.
    pub fn condense(&mut self, policy: crate::config::CondensationPolicy) {
        use crate::config::CondensationPolicy as P;
        if policy == P::Disabled || self.mappings.is_empty() {
            return;
        }
        for slot in PropagatableSlot::all() {
            let values: Vec<Option<SlotValue>> = self
                .mappings
                .iter()
                .map(|m| get_propagatable(m, *slot))
                .collect();
            let Some(first) = values.first().cloned().flatten() else {
                continue;
            };
            if first.is_empty() {
                continue;
            }
            let all_same = values.iter().all(|v| v.as_ref() == Some(&first));
            if !all_same {
                continue;
            }
            let set_value = self.propagatable.get(slot);
            let conflict = matches!(set_value, Some(existing) if existing != &first);
            if conflict && policy == P::NeverReplace {
                continue;
            }
            self.propagatable.insert(*slot, first);
            for mapping in &mut self.mappings {
                super::mapping::clear_propagatable(mapping, *slot);
            }
        }
    }

    /// Apply the writer preconditions described in §4.F: default license,
    /// synthesise a mapping-set identifier, and condense propagatable slots.
    pub fn canonicalise_for_write(&self, policy: crate::config::CondensationPolicy) -> Self {
        let mut out = self.clone();
        if out.license.is_empty() {
            out.license = DEFAULT_LICENSE.to_string();
        }
        if out.mapping_set_id.is_empty() {
            out.mapping_set_id = format!("http://sssom.invalid/{}", uuid::Uuid::new_v4());
        }
        out.condense(policy);
        out
    }
}

/// A thin wrapper for a source that may yield zero or more mapping sets,
/// e.g. a multi-document YAML stream or a pipeline fan-out.
#[derive(Debug, Clone, Default)]
pub struct MappingSetCollection {
    /// The contained sets, in encounter order.
    pub sets: Vec<MappingSet>,
}

impl MappingSetCollection {
    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the collection has no sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CondensationPolicy;
    use crate::model::mapping::MappingBuilder;

    fn mapping_with_source(source: &str) -> Mapping {
        MappingBuilder::new()
            .subject_id("https://example.org/A")
            .predicate_id("http://www.w3.org/2004/02/skos/core#closeMatch")
            .object_id("https://example.org/B")
            .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
            .build()
            .map(|mut m| {
                m.subject_source = Some(source.to_string());
                m
            })
            .unwrap()
    }

    #[test]
    fn propagate_fills_empty_mapping_slots_only() {
        let mut set = MappingSet::new();
        set.set_propagatable(
            PropagatableSlot::SubjectSource,
            SlotValue::Str("ORGENT".to_string()),
        );
        let mut untouched = mapping_with_source("KEEP_ME");
        untouched.subject_source = Some("KEEP_ME".to_string());
        let mut bare = mapping_with_source("x");
        bare.subject_source = None;
        set.mappings = vec![bare, untouched];

        set.propagate();
        assert_eq!(set.mappings[0].subject_source.as_deref(), Some("ORGENT"));
        assert_eq!(set.mappings[1].subject_source.as_deref(), Some("KEEP_ME"));
    }

    #[test]
    fn propagate_is_idempotent() {
        let mut set = MappingSet::new();
        set.set_propagatable(
            PropagatableSlot::SubjectSource,
            SlotValue::Str("ORGENT".to_string()),
        );
        set.mappings = vec![mapping_with_source("x").tap_clear_source()];
        set.propagate();
        let once = set.clone();
        set.propagate();
        assert_eq!(once, set);
    }

    #[test]
    fn condense_restores_set_level_value_and_clears_mappings() {
        let mut set = MappingSet::new();
        let mut m1 = mapping_with_source("x");
        m1.subject_source = Some("ORGENT".to_string());
        let mut m2 = mapping_with_source("x");
        m2.subject_source = Some("ORGENT".to_string());
        set.mappings = vec![m1, m2];

        set.condense(CondensationPolicy::NeverReplace);
        assert_eq!(
            set.get_propagatable(PropagatableSlot::SubjectSource),
            Some(&SlotValue::Str("ORGENT".to_string()))
        );
        assert!(set.mappings.iter().all(|m| m.subject_source.is_none()));
    }

    #[test]
    fn condense_then_propagate_round_trips_when_no_mapping_only_values() {
        let mut set = MappingSet::new();
        set.set_propagatable(
            PropagatableSlot::SubjectSource,
            SlotValue::Str("ORGENT".to_string()),
        );
        let mut m1 = mapping_with_source("x");
        m1.subject_source = None;
        let mut m2 = mapping_with_source("x");
        m2.subject_source = None;
        set.mappings = vec![m1, m2];

        let before = set.clone();
        set.propagate();
        set.condense(CondensationPolicy::NeverReplace);
        assert_eq!(before, set);
    }

    #[test]
    fn never_replace_keeps_conflicting_set_level_value() {
        let mut set = MappingSet::new();
        set.set_propagatable(
            PropagatableSlot::SubjectSource,
            SlotValue::Str("OLD".to_string()),
        );
        let mut m1 = mapping_with_source("x");
        m1.subject_source = Some("NEW".to_string());
        let mut m2 = mapping_with_source("x");
        m2.subject_source = Some("NEW".to_string());
        set.mappings = vec![m1, m2];

        set.condense(CondensationPolicy::NeverReplace);
        assert_eq!(
            set.get_propagatable(PropagatableSlot::SubjectSource),
            Some(&SlotValue::Str("OLD".to_string()))
        );
    }

    #[test]
    fn canonicalise_for_write_fills_license_and_id() {
        let set = MappingSet::new();
        let out = set.canonicalise_for_write(CondensationPolicy::NeverReplace);
        assert_eq!(out.license, DEFAULT_LICENSE);
        assert!(out.mapping_set_id.starts_with("http://sssom.invalid/"));
    }

    trait TapClearSource {
        fn tap_clear_source(self) -> Self;
    }

    impl TapClearSource for Mapping {
        fn tap_clear_source(mut self) -> Self {
            self.subject_source = None;
            self
        }
    }
}

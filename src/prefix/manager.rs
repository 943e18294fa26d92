//! The Prefix Manager (component A).

use crate::error::{Result, SssomError};
use crate::model::mapping::Mapping;
use crate::model::mapping_set::MappingSet;
use indexmap::IndexMap;
use std::collections::HashSet;

/// SSSOM builtin prefixes — always present, never serialised into a
/// written prefix map.
pub const BUILTIN_PREFIXES: &[(&str, &str)] = &[
    ("sssom", "https://w3id.org/sssom/"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("semapv", "https://w3id.org/semapv/vocab/"),
    ("linkml", "https://w3id.org/linkml/"),
];

/// Shortens/expands identifiers against a prefix map; enforces canonical
/// prefixes; records IRIs that could not be shortened.
#[derive(Debug, Clone, Default)]
pub struct PrefixManager {
    short_to_prefix: IndexMap<String, String>,
    unshortenable: HashSet<String>,
}

impl PrefixManager {
    /// A manager seeded only with the SSSOM builtin prefixes.
    #[must_use]
    pub fn new() -> Self {
        let mut short_to_prefix = IndexMap::new();
        for (short, prefix) in BUILTIN_PREFIXES {
            short_to_prefix.insert((*short).to_string(), (*prefix).to_string());
        }
        Self {
            short_to_prefix,
            unshortenable: HashSet::new(),
        }
    }

    /// Build a manager from a user-supplied prefix map, merged over the
    /// builtins (builtins never lose to a user value of the same name,
    /// matching "always present").
    #[must_use]
    pub fn from_prefix_map(map: &crate::model::mapping_set::PrefixMap) -> Self {
        let mut mgr = Self::new();
        for (short, prefix) in map.iter() {
            mgr.merge_one(short, prefix, false);
        }
        mgr
    }

    /// Insert or remove one mapping, honouring the `"none"` removal sentinel.
    fn merge_one(&mut self, short: &str, prefix: &str, overwrite: bool) {
        if prefix == "none" {
            self.short_to_prefix.shift_remove(short);
            return;
        }
        if overwrite || !self.short_to_prefix.contains_key(short) {
            self.short_to_prefix
                .insert(short.to_string(), prefix.to_string());
        }
    }

    /// Merge another short->prefix map in. On conflict, the incumbent wins
    /// unless `overwrite` is set — the caller chooses precedence by calling
    /// `merge` in the order it wants to win.
    pub fn merge(&mut self, other: &crate::model::mapping_set::PrefixMap, overwrite: bool) {
        for (short, prefix) in other.iter() {
            self.merge_one(short, prefix, overwrite);
        }
    }

    /// Expand a CURIE to a full IRI.
    ///
    /// Strings that already contain `://` pass through unchanged. An
    /// undeclared short prefix is a hard error.
    ///
    /// # Errors
    /// Returns [`SssomError::Prefix`] when `curie`'s short name is not
    /// declared.
    pub fn expand(&self, curie: &str) -> Result<String> {
        if curie.contains("://") {
            return Ok(curie.to_string());
        }
        let Some((short, local)) = curie.split_once(':') else {
            return Ok(curie.to_string());
        };
        match self.short_to_prefix.get(short) {
            Some(prefix) => Ok(format!("{prefix}{local}")),
            None => Err(SssomError::prefix_for(
                format!("Undeclared prefix: {short}"),
                curie,
            )),
        }
    }

    /// Shorten an IRI to a CURIE by the longest matching prefix value.
    /// Records the IRI as unshortenable (and returns `None`) if nothing
    /// matches.
    pub fn shorten(&mut self, iri: &str) -> Option<String> {
        let best = self
            .short_to_prefix
            .iter()
            .filter(|(_, prefix)| iri.starts_with(prefix.as_str()))
            .max_by_key(|(_, prefix)| prefix.len());
        match best {
            Some((short, prefix)) => Some(format!("{short}:{}", &iri[prefix.len()..])),
            None => {
                self.unshortenable.insert(iri.to_string());
                None
            }
        }
    }

    /// Shorten without recording a miss (read-only callers, e.g. the
    /// formatter's `short` modifier).
    #[must_use]
    pub fn try_shorten(&self, iri: &str) -> Option<String> {
        self.short_to_prefix
            .iter()
            .filter(|(_, prefix)| iri.starts_with(prefix.as_str()))
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(short, prefix)| format!("{short}:{}", &iri[prefix.len()..]))
    }

    /// IRIs that failed to shorten since construction (or since the last
    /// call to [`PrefixManager::clear_unshortenable`]).
    #[must_use]
    pub fn unshortenable(&self) -> &HashSet<String> {
        &self.unshortenable
    }

    /// Reset the accumulated unshortenable-IRI set.
    pub fn clear_unshortenable(&mut self) {
        self.unshortenable.clear();
    }

    /// Whether `short` is one of the builtin prefixes (never serialised).
    #[must_use]
    pub fn is_builtin(short: &str) -> bool {
        BUILTIN_PREFIXES.iter().any(|(b, _)| *b == short)
    }

    /// Every short name the entity-reference slots of `set` need, to
    /// shorten every one of their IRIs — the set writer's "only emit used
    /// prefixes" precondition.
    pub fn used_prefixes(&mut self, set: &MappingSet) -> HashSet<String> {
        let mut used = HashSet::new();
        for mapping in &set.mappings {
            self.collect_used_prefixes_for_mapping(mapping, &mut used);
        }
        used
    }

    fn collect_used_prefixes_for_mapping(&mut self, mapping: &Mapping, used: &mut HashSet<String>) {
        use crate::model::registry::MAPPING_SLOTS;
        use crate::model::value::SlotValue;
        for slot in MAPPING_SLOTS.iter() {
            if !slot.entity_reference {
                continue;
            }
            if let Some(SlotValue::Str(iri)) = (slot.get)(mapping) {
                if let Some(curie) = self.shorten(&iri) {
                    if let Some((short, _)) = curie.split_once(':') {
                        used.insert(short.to_string());
                    }
                }
            } else if let Some(SlotValue::StrList(iris)) = (slot.get)(mapping) {
                for iri in iris {
                    if let Some(curie) = self.shorten(&iri) {
                        if let Some((short, _)) = curie.split_once(':') {
                            used.insert(short.to_string());
                        }
                    }
                }
            }
        }
    }

    /// Export the effective map (builtins excluded) for writing.
    #[must_use]
    pub fn to_written_prefix_map(
        &self,
        only: &HashSet<String>,
    ) -> crate::model::mapping_set::PrefixMap {
        let mut out = crate::model::mapping_set::PrefixMap::new();
        for (short, prefix) in &self.short_to_prefix {
            if Self::is_builtin(short) {
                continue;
            }
            if !only.is_empty() && !only.contains(short) {
                continue;
            }
            out.insert(short.clone(), prefix.clone());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_always_present() {
        let mgr = PrefixManager::new();
        assert_eq!(
            mgr.expand("skos:exactMatch").unwrap(),
            "http://www.w3.org/2004/02/skos/core#exactMatch"
        );
    }

    #[test]
    fn expand_passes_through_absolute_iris() {
        let mgr = PrefixManager::new();
        assert_eq!(
            mgr.expand("https://example.org/X").unwrap(),
            "https://example.org/X"
        );
    }

    #[test]
    fn expand_rejects_undeclared_prefix() {
        let mgr = PrefixManager::new();
        let err = mgr.expand("FOO:0001").unwrap_err();
        assert!(matches!(err, SssomError::Prefix { .. }));
    }

    #[test]
    fn shorten_picks_longest_matching_prefix() {
        let mut mgr = PrefixManager::new();
        mgr.short_to_prefix
            .insert("OBO".to_string(), "http://purl.obolibrary.org/obo/".to_string());
        mgr.short_to_prefix.insert(
            "UBERON".to_string(),
            "http://purl.obolibrary.org/obo/UBERON_".to_string(),
        );
        let curie = mgr
            .shorten("http://purl.obolibrary.org/obo/UBERON_0000001")
            .unwrap();
        assert_eq!(curie, "UBERON:0000001");
    }

    #[test]
    fn shorten_records_misses() {
        let mut mgr = PrefixManager::new();
        assert!(mgr.shorten("https://unknown.example/X").is_none());
        assert!(mgr.unshortenable().contains("https://unknown.example/X"));
    }

    #[test]
    fn expand_shorten_duality() {
        let mut mgr = PrefixManager::new();
        let iri = "http://www.w3.org/2004/02/skos/core#closeMatch";
        let curie = mgr.shorten(iri).unwrap();
        assert_eq!(mgr.expand(&curie).unwrap(), iri);
    }

    #[test]
    fn merge_none_removes_a_mapping() {
        let mut pm = crate::model::mapping_set::PrefixMap::new();
        pm.insert("FOO", "https://example.org/foo/");
        let mut mgr = PrefixManager::from_prefix_map(&pm);
        assert!(mgr.expand("FOO:1").is_ok());
        let mut removal = crate::model::mapping_set::PrefixMap::new();
        removal.insert("FOO", "none");
        mgr.merge(&removal, true);
        assert!(mgr.expand("FOO:1").is_err());
    }

    #[test]
    fn builtins_never_appear_in_written_map() {
        let mgr = PrefixManager::new();
        let only = HashSet::new();
        let written = mgr.to_written_prefix_map(&only);
        assert!(written.get("skos").is_none());
    }
}

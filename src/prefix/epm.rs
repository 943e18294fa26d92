//! The Extended Prefix Map (component B).

use crate::error::Result;
use indexmap::IndexMap;

/// Application mode re-exported for convenience at call sites that only
/// need the EPM, not the rest of [`crate::config`].
pub use crate::config::EpmMode;

/// One entry: a canonical short name / IRI prefix plus any number of
/// synonym short names and synonym IRI prefixes that should resolve to the
/// same canonical forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRecord {
    /// The canonical short name, e.g. `"OBO"`.
    pub canonical_short: String,
    /// The canonical IRI prefix, e.g. `"http://purl.obolibrary.org/obo/"`.
    pub canonical_prefix: String,
    /// Alternative short names that should canonicalise to `canonical_short`.
    pub short_synonyms: Vec<String>,
    /// Alternative IRI prefixes that should canonicalise to `canonical_prefix`.
    pub prefix_synonyms: Vec<String>,
}

impl PrefixRecord {
    /// A record with no synonyms.
    #[must_use]
    pub fn new(canonical_short: impl Into<String>, canonical_prefix: impl Into<String>) -> Self {
        Self {
            canonical_short: canonical_short.into(),
            canonical_prefix: canonical_prefix.into(),
            short_synonyms: Vec::new(),
            prefix_synonyms: Vec::new(),
        }
    }

    /// Add a short-name synonym, builder-style.
    #[must_use]
    pub fn with_short_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.short_synonyms.push(synonym.into());
        self
    }

    /// Add an IRI-prefix synonym, builder-style.
    #[must_use]
    pub fn with_prefix_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.prefix_synonyms.push(synonym.into());
        self
    }
}

/// A table of [`PrefixRecord`]s, indexed for fast canonicalisation in both
/// directions.
#[derive(Debug, Clone, Default)]
pub struct ExtendedPrefixMap {
    records: Vec<PrefixRecord>,
    short_index: IndexMap<String, usize>,
    prefix_index: IndexMap<String, usize>,
}

impl ExtendedPrefixMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one record; its canonical and synonym short names/prefixes
    /// are all indexed.
    pub fn add_record(&mut self, record: PrefixRecord) {
        let idx = self.records.len();
        self.short_index.insert(record.canonical_short.clone(), idx);
        for s in &record.short_synonyms {
            self.short_index.insert(s.clone(), idx);
        }
        self.prefix_index
            .insert(record.canonical_prefix.clone(), idx);
        for p in &record.prefix_synonyms {
            self.prefix_index.insert(p.clone(), idx);
        }
        self.records.push(record);
    }

    /// Rewrite `iri` to use its canonical prefix if any synonym IRI prefix
    /// (or the canonical one) is a prefix of it. The *longest* matching
    /// prefix value wins, mirroring [`crate::prefix::manager::PrefixManager::shorten`].
    #[must_use]
    pub fn canonicalise_iri(&self, iri: &str) -> String {
        let best = self
            .prefix_index
            .iter()
            .filter(|(prefix, _)| iri.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len());
        match best {
            Some((prefix, &idx)) => {
                let record = &self.records[idx];
                format!("{}{}", record.canonical_prefix, &iri[prefix.len()..])
            }
            None => iri.to_string(),
        }
    }

    /// Map a short name to its canonical short name, if known; otherwise
    /// return it unchanged.
    #[must_use]
    pub fn canonicalise_prefix<'a>(&'a self, name: &'a str) -> &'a str {
        match self.short_index.get(name) {
            Some(&idx) => self.records[idx].canonical_short.as_str(),
            None => name,
        }
    }

    /// Expand a CURIE using canonical forms: canonicalise the short name
    /// first, then concatenate its canonical prefix with the local part.
    ///
    /// # Errors
    /// Returns an error if the short name (after canonicalisation) is not
    /// registered.
    pub fn resolve(&self, curie: &str) -> Result<String> {
        let Some((short, local)) = curie.split_once(':') else {
            return Ok(curie.to_string());
        };
        let canonical_short = self.canonicalise_prefix(short);
        match self.short_index.get(canonical_short) {
            Some(&idx) => Ok(format!("{}{}", self.records[idx].canonical_prefix, local)),
            None => Err(crate::error::SssomError::prefix_for(
                format!("Undeclared prefix in extended prefix map: {short}"),
                curie,
            )),
        }
    }

    /// Number of registered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the map has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Apply canonicalisation to every entity-reference IRI on a mapping's
/// slots, per the configured [`EpmMode`] and read/write direction.
pub fn apply_to_mapping(
    epm: &ExtendedPrefixMap,
    mapping: &mut crate::model::mapping::Mapping,
    mode: EpmMode,
    on_read: bool,
) {
    use crate::model::registry::MAPPING_SLOTS;
    use crate::model::value::SlotValue;

    let active = match (mode, on_read) {
        (EpmMode::Off, _) => false,
        (EpmMode::Pre, true) | (EpmMode::Post, false) | (EpmMode::Both, _) => true,
        _ => false,
    };
    if !active || epm.is_empty() {
        return;
    }

    for slot in MAPPING_SLOTS.iter() {
        if !slot.entity_reference {
            continue;
        }
        match (slot.get)(mapping) {
            Some(SlotValue::Str(iri)) => {
                let canon = epm.canonicalise_iri(&iri);
                let _ = (slot.set)(mapping, Some(SlotValue::Str(canon)));
            }
            Some(SlotValue::StrList(iris)) => {
                let canon: Vec<String> = iris.iter().map(|i| epm.canonicalise_iri(i)).collect();
                let _ = (slot.set)(mapping, Some(SlotValue::StrList(canon)));
            }
            _ => {}
        }
    }
}

//! The `Mapping` entity (component G) — the unit of assertion.

use super::extension::ExtensionDefinition;
use super::value::{Cardinality, ExtensionValue, PredicateModifier, SlotValue};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The sentinel subject/object used by "missing mappings" (§3 invariants).
pub const NO_TERM_FOUND: &str = "https://w3id.org/sssom/NoTermFound";

/// One cross-ontology equivalence assertion.
///
/// Entity-reference fields (`subject_id`, `predicate_id`, `object_id`,
/// `mapping_justification`, author/reviewer/creator ids, `subject_source`,
/// `object_source`, `mapping_provider`) always hold a full IRI at rest —
/// CURIEs exist only at the TSV/DSL boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Mapping {
    /// Required. Entity reference.
    pub subject_id: String,
    /// Optional human-readable label for `subject_id`.
    pub subject_label: Option<String>,
    /// Optional category, e.g. `biolink:Gene`.
    pub subject_category: Option<String>,
    /// Propagatable. Source ontology/vocabulary of the subject.
    pub subject_source: Option<String>,
    /// Propagatable. Version of `subject_source`.
    pub subject_source_version: Option<String>,
    /// Propagatable enum. `owl:Class`, `owl:NamedIndividual`, etc.
    pub subject_type: Option<String>,
    /// Propagatable. Fields that were matched against to produce this mapping.
    pub subject_match_field: Vec<String>,
    /// Propagatable. Preprocessing steps applied to the subject side.
    pub subject_preprocessing: Vec<String>,

    /// Required. Entity reference.
    pub predicate_id: String,
    /// Optional human-readable label for `predicate_id`.
    pub predicate_label: Option<String>,
    /// Negates the predicate when present.
    pub predicate_modifier: Option<PredicateModifier>,
    /// Propagatable enum, mirrors `subject_type`/`object_type`.
    pub predicate_type: Option<String>,

    /// Required. Entity reference.
    pub object_id: String,
    /// Optional human-readable label for `object_id`.
    pub object_label: Option<String>,
    /// Optional category, e.g. `biolink:Disease`.
    pub object_category: Option<String>,
    /// Propagatable. Source ontology/vocabulary of the object.
    pub object_source: Option<String>,
    /// Propagatable. Version of `object_source`.
    pub object_source_version: Option<String>,
    /// Propagatable enum.
    pub object_type: Option<String>,
    /// Propagatable.
    pub object_match_field: Vec<String>,
    /// Propagatable.
    pub object_preprocessing: Vec<String>,

    /// Required. Entity reference to a `semapv:` (or other) justification term.
    pub mapping_justification: String,

    /// Author identifiers (entity references).
    pub author_id: Vec<String>,
    /// Author labels.
    pub author_label: Vec<String>,
    /// Reviewer identifiers.
    pub reviewer_id: Vec<String>,
    /// Reviewer labels.
    pub reviewer_label: Vec<String>,
    /// Creator identifiers.
    pub creator_id: Vec<String>,
    /// Creator labels.
    pub creator_label: Vec<String>,

    /// Propagatable. Date this mapping was produced.
    pub mapping_date: Option<NaiveDate>,
    /// Confidence in [0, 1].
    pub confidence: Option<f64>,
    /// Similarity score in [0, 1].
    pub similarity_score: Option<f64>,
    /// Propagatable. Name of the measure used to compute `similarity_score`.
    pub similarity_measure: Option<String>,

    /// Free text describing the curation rule behind this mapping.
    pub curation_rule: Vec<String>,
    /// Free text, the curation rule's full text.
    pub curation_rule_text: Vec<String>,
    /// Raw strings that were matched to produce this mapping.
    pub match_string: Vec<String>,

    /// Mapping cardinality.
    pub mapping_cardinality: Option<Cardinality>,
    /// Propagatable. Name/version of the tool that produced this mapping.
    pub mapping_tool: Option<String>,
    /// Propagatable. Version of `mapping_tool`.
    pub mapping_tool_version: Option<String>,
    /// Propagatable. Entity reference to the mapping provider.
    pub mapping_provider: Option<String>,

    /// Free-text comment.
    pub comment: Option<String>,
    /// `rdfs:seeAlso`-style list of related resources.
    pub see_also: Vec<String>,

    /// User-defined extension values, keyed by property IRI.
    pub extension_values: IndexMap<String, ExtensionValue>,
}

impl Mapping {
    /// Whether this is a "missing mapping" per the `sssom:NoTermFound` sentinel.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.subject_id == NO_TERM_FOUND || self.object_id == NO_TERM_FOUND
    }

    /// Set `confidence`, enforcing the `[0, 1]` invariant.
    ///
    /// # Errors
    /// Returns an error if `value` is outside `[0, 1]`.
    pub fn set_confidence(&mut self, value: f64) -> Result<(), String> {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("confidence {value} is not in [0, 1]"));
        }
        self.confidence = Some(value);
        Ok(())
    }

    /// Set `similarity_score`, enforcing the `[0, 1]` invariant.
    ///
    /// # Errors
    /// Returns an error if `value` is outside `[0, 1]`.
    pub fn set_similarity_score(&mut self, value: f64) -> Result<(), String> {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("similarity_score {value} is not in [0, 1]"));
        }
        self.similarity_score = Some(value);
        Ok(())
    }

    /// Produce the inverse of this mapping.
    ///
    /// Subject and object (and their label/category/source/source-version/
    /// match-field/preprocessing siblings) are swapped; the predicate is
    /// replaced with `predicate_override` if given, else looked up in
    /// `invertible_predicates`; cardinality is inverted. Returns `None` when
    /// no predicate override was given and the predicate has no known
    /// inverse.
    #[must_use]
    pub fn invert(
        &self,
        invertible_predicates: &IndexMap<String, String>,
        predicate_override: Option<&str>,
    ) -> Option<Self> {
        let inverse_predicate = match predicate_override {
            Some(p) => p.to_string(),
            None => invertible_predicates.get(&self.predicate_id)?.clone(),
        };

        Some(Self {
            subject_id: self.object_id.clone(),
            subject_label: self.object_label.clone(),
            subject_category: self.object_category.clone(),
            subject_source: self.object_source.clone(),
            subject_source_version: self.object_source_version.clone(),
            subject_type: self.object_type.clone(),
            subject_match_field: self.object_match_field.clone(),
            subject_preprocessing: self.object_preprocessing.clone(),

            predicate_id: inverse_predicate,
            predicate_label: None,
            predicate_modifier: self.predicate_modifier,
            predicate_type: self.predicate_type.clone(),

            object_id: self.subject_id.clone(),
            object_label: self.subject_label.clone(),
            object_category: self.subject_category.clone(),
            object_source: self.subject_source.clone(),
            object_source_version: self.subject_source_version.clone(),
            object_type: self.subject_type.clone(),
            object_match_field: self.subject_match_field.clone(),
            object_preprocessing: self.subject_preprocessing.clone(),

            mapping_cardinality: self.mapping_cardinality.map(Cardinality::inverted),

            ..self.clone()
        })
    }

    /// The canonical total-order string form used for set operations and
    /// stable hashing: lengths are prefixed to make the encoding unambiguous,
    /// slots appear in declaration order, lists are sorted lexicographically,
    /// and extensions are sorted by property IRI.
    #[must_use]
    pub fn canonical_sexpr(&self) -> String {
        let mut out = String::new();
        write_field(&mut out, &self.subject_id);
        write_opt(&mut out, self.subject_label.as_deref());
        write_opt(&mut out, self.subject_category.as_deref());
        write_opt(&mut out, self.subject_source.as_deref());
        write_opt(&mut out, self.subject_source_version.as_deref());
        write_opt(&mut out, self.subject_type.as_deref());
        write_list(&mut out, &self.subject_match_field);
        write_list(&mut out, &self.subject_preprocessing);

        write_field(&mut out, &self.predicate_id);
        write_opt(&mut out, self.predicate_label.as_deref());
        write_opt(
            &mut out,
            self.predicate_modifier.map(PredicateModifier::as_str),
        );
        write_opt(&mut out, self.predicate_type.as_deref());

        write_field(&mut out, &self.object_id);
        write_opt(&mut out, self.object_label.as_deref());
        write_opt(&mut out, self.object_category.as_deref());
        write_opt(&mut out, self.object_source.as_deref());
        write_opt(&mut out, self.object_source_version.as_deref());
        write_opt(&mut out, self.object_type.as_deref());
        write_list(&mut out, &self.object_match_field);
        write_list(&mut out, &self.object_preprocessing);

        write_field(&mut out, &self.mapping_justification);

        write_list(&mut out, &self.author_id);
        write_list(&mut out, &self.author_label);
        write_list(&mut out, &self.reviewer_id);
        write_list(&mut out, &self.reviewer_label);
        write_list(&mut out, &self.creator_id);
        write_list(&mut out, &self.creator_label);

        write_opt(&mut out, self.mapping_date.map(|d| d.to_string()).as_deref());
        write_opt(&mut out, self.confidence.map(|c| c.to_string()).as_deref());
        write_opt(
            &mut out,
            self.similarity_score.map(|c| c.to_string()).as_deref(),
        );
        write_opt(&mut out, self.similarity_measure.as_deref());

        write_list(&mut out, &self.curation_rule);
        write_list(&mut out, &self.curation_rule_text);
        write_list(&mut out, &self.match_string);

        write_opt(
            &mut out,
            self.mapping_cardinality.map(Cardinality::as_str),
        );
        write_opt(&mut out, self.mapping_tool.as_deref());
        write_opt(&mut out, self.mapping_tool_version.as_deref());
        write_opt(&mut out, self.mapping_provider.as_deref());

        write_opt(&mut out, self.comment.as_deref());
        write_list(&mut out, &self.see_also);

        let mut exts: Vec<_> = self.extension_values.iter().collect();
        exts.sort_by(|a, b| a.0.cmp(b.0));
        for (k, v) in exts {
            write_field(&mut out, k);
            write_field(&mut out, &v.to_cell_string());
        }

        out
    }
}

fn write_field(out: &mut String, value: &str) {
    out.push_str(&value.len().to_string());
    out.push(':');
    out.push_str(value);
    out.push(';');
}

fn write_opt(out: &mut String, value: Option<&str>) {
    match value {
        Some(v) => write_field(out, v),
        None => out.push_str("0:;"),
    }
}

fn write_list(out: &mut String, values: &[String]) {
    let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    out.push_str(&sorted.len().to_string());
    out.push('[');
    for v in sorted {
        write_field(out, v);
    }
    out.push(']');
}

/// Builder for [`Mapping`], enforcing that the three mandatory ID slots and
/// the justification are supplied before the mapping can be built.
#[derive(Debug, Clone, Default)]
pub struct MappingBuilder {
    mapping: Mapping,
}

impl MappingBuilder {
    /// Start a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the required `subject_id`.
    #[must_use]
    pub fn subject_id(mut self, id: impl Into<String>) -> Self {
        self.mapping.subject_id = id.into();
        self
    }

    /// Set the required `predicate_id`.
    #[must_use]
    pub fn predicate_id(mut self, id: impl Into<String>) -> Self {
        self.mapping.predicate_id = id.into();
        self
    }

    /// Set the required `object_id`.
    #[must_use]
    pub fn object_id(mut self, id: impl Into<String>) -> Self {
        self.mapping.object_id = id.into();
        self
    }

    /// Set the required `mapping_justification`.
    #[must_use]
    pub fn mapping_justification(mut self, id: impl Into<String>) -> Self {
        self.mapping.mapping_justification = id.into();
        self
    }

    /// Finish building, checking that every mandatory slot was supplied.
    ///
    /// # Errors
    /// Returns an error naming the first missing mandatory slot.
    pub fn build(self) -> Result<Mapping, String> {
        if self.mapping.subject_id.is_empty() {
            return Err("subject_id is required".to_string());
        }
        if self.mapping.predicate_id.is_empty() {
            return Err("predicate_id is required".to_string());
        }
        if self.mapping.object_id.is_empty() {
            return Err("object_id is required".to_string());
        }
        if self.mapping.mapping_justification.is_empty() {
            return Err("mapping_justification is required".to_string());
        }
        Ok(self.mapping)
    }
}

/// Read a named propagatable slot's current value off a mapping.
#[must_use]
pub fn get_propagatable(mapping: &Mapping, slot: PropagatableSlot) -> Option<SlotValue> {
    use PropagatableSlot::*;
    match slot {
        SubjectSource => mapping.subject_source.clone().map(SlotValue::Str),
        SubjectSourceVersion => mapping.subject_source_version.clone().map(SlotValue::Str),
        ObjectSource => mapping.object_source.clone().map(SlotValue::Str),
        ObjectSourceVersion => mapping.object_source_version.clone().map(SlotValue::Str),
        MappingTool => mapping.mapping_tool.clone().map(SlotValue::Str),
        MappingToolVersion => mapping.mapping_tool_version.clone().map(SlotValue::Str),
        MappingDate => mapping.mapping_date.map(SlotValue::Date),
        SubjectMatchField => non_empty_list(&mapping.subject_match_field),
        ObjectMatchField => non_empty_list(&mapping.object_match_field),
        SubjectPreprocessing => non_empty_list(&mapping.subject_preprocessing),
        ObjectPreprocessing => non_empty_list(&mapping.object_preprocessing),
        SubjectType => mapping.subject_type.clone().map(SlotValue::Enum),
        ObjectType => mapping.object_type.clone().map(SlotValue::Enum),
        PredicateType => mapping.predicate_type.clone().map(SlotValue::Enum),
        SimilarityMeasure => mapping.similarity_measure.clone().map(SlotValue::Str),
        MappingProvider => mapping.mapping_provider.clone().map(SlotValue::Str),
    }
}

/// Write a named propagatable slot's value onto a mapping, only if the
/// slot is currently empty (used by the propagator's "don't overwrite"
/// rule).
pub fn set_propagatable_if_empty(mapping: &mut Mapping, slot: PropagatableSlot, value: &SlotValue) {
    use PropagatableSlot::*;
    if get_propagatable(mapping, slot).is_some() {
        return;
    }
    match (slot, value) {
        (SubjectSource, SlotValue::Str(s)) => mapping.subject_source = Some(s.clone()),
        (SubjectSourceVersion, SlotValue::Str(s)) => {
            mapping.subject_source_version = Some(s.clone());
        }
        (ObjectSource, SlotValue::Str(s)) => mapping.object_source = Some(s.clone()),
        (ObjectSourceVersion, SlotValue::Str(s)) => {
            mapping.object_source_version = Some(s.clone());
        }
        (MappingTool, SlotValue::Str(s)) => mapping.mapping_tool = Some(s.clone()),
        (MappingToolVersion, SlotValue::Str(s)) => mapping.mapping_tool_version = Some(s.clone()),
        (MappingDate, SlotValue::Date(d)) => mapping.mapping_date = Some(*d),
        (SubjectMatchField, SlotValue::StrList(l)) => mapping.subject_match_field = l.clone(),
        (ObjectMatchField, SlotValue::StrList(l)) => mapping.object_match_field = l.clone(),
        (SubjectPreprocessing, SlotValue::StrList(l)) => mapping.subject_preprocessing = l.clone(),
        (ObjectPreprocessing, SlotValue::StrList(l)) => mapping.object_preprocessing = l.clone(),
        (SubjectType, SlotValue::Enum(s)) => mapping.subject_type = Some(s.clone()),
        (ObjectType, SlotValue::Enum(s)) => mapping.object_type = Some(s.clone()),
        (PredicateType, SlotValue::Enum(s)) => mapping.predicate_type = Some(s.clone()),
        (SimilarityMeasure, SlotValue::Str(s)) => mapping.similarity_measure = Some(s.clone()),
        (MappingProvider, SlotValue::Str(s)) => mapping.mapping_provider = Some(s.clone()),
        _ => {}
    }
}

/// Clear a named propagatable slot on a mapping (used during condensation).
pub fn clear_propagatable(mapping: &mut Mapping, slot: PropagatableSlot) {
    use PropagatableSlot::*;
    match slot {
        SubjectSource => mapping.subject_source = None,
        SubjectSourceVersion => mapping.subject_source_version = None,
        ObjectSource => mapping.object_source = None,
        ObjectSourceVersion => mapping.object_source_version = None,
        MappingTool => mapping.mapping_tool = None,
        MappingToolVersion => mapping.mapping_tool_version = None,
        MappingDate => mapping.mapping_date = None,
        SubjectMatchField => mapping.subject_match_field.clear(),
        ObjectMatchField => mapping.object_match_field.clear(),
        SubjectPreprocessing => mapping.subject_preprocessing.clear(),
        ObjectPreprocessing => mapping.object_preprocessing.clear(),
        SubjectType => mapping.subject_type = None,
        ObjectType => mapping.object_type = None,
        PredicateType => mapping.predicate_type = None,
        SimilarityMeasure => mapping.similarity_measure = None,
        MappingProvider => mapping.mapping_provider = None,
    }
}

fn non_empty_list(list: &[String]) -> Option<SlotValue> {
    if list.is_empty() {
        None
    } else {
        Some(SlotValue::StrList(list.to_vec()))
    }
}

/// The propagatable slots named in `spec.md` §4.E, shared between
/// [`Mapping`] and [`crate::model::mapping_set::MappingSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropagatableSlot {
    /// `subject_source`
    SubjectSource,
    /// `subject_source_version`
    SubjectSourceVersion,
    /// `object_source`
    ObjectSource,
    /// `object_source_version`
    ObjectSourceVersion,
    /// `mapping_tool`
    MappingTool,
    /// `mapping_tool_version`
    MappingToolVersion,
    /// `mapping_date`
    MappingDate,
    /// `subject_match_field`
    SubjectMatchField,
    /// `object_match_field`
    ObjectMatchField,
    /// `subject_preprocessing`
    SubjectPreprocessing,
    /// `object_preprocessing`
    ObjectPreprocessing,
    /// `subject_type`
    SubjectType,
    /// `object_type`
    ObjectType,
    /// `predicate_type`
    PredicateType,
    /// `similarity_measure`
    SimilarityMeasure,
    /// `mapping_provider`
    MappingProvider,
}

impl PropagatableSlot {
    /// All propagatable slots, in a stable order.
    #[must_use]
    pub fn all() -> &'static [PropagatableSlot] {
        use PropagatableSlot::*;
        &[
            SubjectSource,
            SubjectSourceVersion,
            ObjectSource,
            ObjectSourceVersion,
            MappingTool,
            MappingToolVersion,
            MappingDate,
            SubjectMatchField,
            ObjectMatchField,
            SubjectPreprocessing,
            ObjectPreprocessing,
            SubjectType,
            ObjectType,
            PredicateType,
            SimilarityMeasure,
            MappingProvider,
        ]
    }

    /// The slot's wire name.
    #[must_use]
    pub fn name(self) -> &'static str {
        use PropagatableSlot::*;
        match self {
            SubjectSource => "subject_source",
            SubjectSourceVersion => "subject_source_version",
            ObjectSource => "object_source",
            ObjectSourceVersion => "object_source_version",
            MappingTool => "mapping_tool",
            MappingToolVersion => "mapping_tool_version",
            MappingDate => "mapping_date",
            SubjectMatchField => "subject_match_field",
            ObjectMatchField => "object_match_field",
            SubjectPreprocessing => "subject_preprocessing",
            ObjectPreprocessing => "object_preprocessing",
            SubjectType => "subject_type",
            ObjectType => "object_type",
            PredicateType => "predicate_type",
            SimilarityMeasure => "similarity_measure",
            MappingProvider => "mapping_provider",
        }
    }
}

//! The six concrete scenarios of `spec.md` §8, exercised end-to-end
//! across the crate's public API.

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use sssom_core::config::{CondensationPolicy, EpmMode, SssomConfig};
use sssom_core::dsl::parser::Parser;
use sssom_core::dsl::FunctionTable;
use sssom_core::model::mapping::{Mapping, MappingBuilder, PropagatableSlot};
use sssom_core::model::mapping_set::PrefixMap;
use sssom_core::model::value::{Cardinality, SlotValue};
use sssom_core::model::MappingSet;
use sssom_core::pipeline::{Pipeline, TagSelection};
use sssom_core::prefix::epm::{ExtendedPrefixMap, PrefixRecord};
use sssom_core::prefix::manager::PrefixManager;
use sssom_core::tsv::{read_mapping_set, write_mapping_set};

fn close_match(subject: &str, object: &str) -> Mapping {
    MappingBuilder::new()
        .subject_id(subject)
        .predicate_id("http://www.w3.org/2004/02/skos/core#closeMatch")
        .object_id(object)
        .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
        .build()
        .unwrap()
}

/// Scenario 1: rename by assignment.
#[test]
fn rename_by_assignment() {
    let prefixes = PrefixManager::new();
    let table = FunctionTable::new();
    let mut parser = Parser::new(&prefixes, &table);
    parser
        .parse("subject==* -> assign('predicate_id', 'skos:exactMatch');")
        .unwrap();
    assert!(!parser.has_errors(), "{:?}", parser.errors());

    let invertible = IndexMap::new();
    let pipeline = Pipeline::new(
        parser.items(),
        &TagSelection::All,
        &prefixes,
        &table,
        &invertible,
        true,
    );

    let mut set = MappingSet::new();
    set.mappings = vec![close_match(
        "https://example.org/ORGENT_0001",
        "https://example.org/COMENT_0011",
    )];

    let out = pipeline.run(&set).unwrap();
    assert_eq!(out.mappings.len(), 1);
    assert_eq!(
        out.mappings[0].predicate_id,
        "http://www.w3.org/2004/02/skos/core#exactMatch"
    );
    assert_eq!(out.mappings[0].subject_id, "https://example.org/ORGENT_0001");
    assert_eq!(out.mappings[0].object_id, "https://example.org/COMENT_0011");
}

/// Scenario 2: include/stop filter keeps only the exactMatch mappings.
#[test]
fn include_stop_filter() {
    let prefixes = PrefixManager::new();
    let table = FunctionTable::new();
    let mut parser = Parser::new(&prefixes, &table);
    parser
        .parse("!predicate==skos:exactMatch -> stop();\nsubject==ORG:* -> include();")
        .unwrap();
    assert!(!parser.has_errors(), "{:?}", parser.errors());

    let invertible = IndexMap::new();
    let pipeline = Pipeline::new(
        parser.items(),
        &TagSelection::All,
        &prefixes,
        &table,
        &invertible,
        false,
    );

    let mut set = MappingSet::new();
    set.mappings = vec![
        close_match("https://example.org/ORG_0001", "https://example.org/O_0001"),
        MappingBuilder::new()
            .subject_id("https://example.org/ORG_0002")
            .predicate_id("http://www.w3.org/2004/02/skos/core#exactMatch")
            .object_id("https://example.org/O_0002")
            .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
            .build()
            .unwrap(),
        MappingBuilder::new()
            .subject_id("https://example.org/ORG_0003")
            .predicate_id("http://www.w3.org/2004/02/skos/core#exactMatch")
            .object_id("https://example.org/O_0003")
            .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
            .build()
            .unwrap(),
    ];

    let out = pipeline.run(&set).unwrap();
    assert_eq!(out.mappings.len(), 2);
    assert!(out
        .mappings
        .iter()
        .all(|m| m.predicate_id == "http://www.w3.org/2004/02/skos/core#exactMatch"));
}

/// Scenario 3: propagation down, then condensation back up.
#[test]
fn propagation_and_condensation() {
    let mut set = MappingSet::new();
    set.set_propagatable(
        PropagatableSlot::SubjectSource,
        SlotValue::Str("ORGENT".to_string()),
    );
    set.mappings = vec![
        close_match("https://example.org/A1", "https://example.org/B1"),
        close_match("https://example.org/A2", "https://example.org/B2"),
        close_match("https://example.org/A3", "https://example.org/B3"),
    ];

    set.propagate();
    assert!(set
        .mappings
        .iter()
        .all(|m| m.subject_source.as_deref() == Some("ORGENT")));

    set.condense(CondensationPolicy::NeverReplace);
    assert_eq!(
        set.get_propagatable(PropagatableSlot::SubjectSource),
        Some(&SlotValue::Str("ORGENT".to_string()))
    );
    assert!(set.mappings.iter().all(|m| m.subject_source.is_none()));
}

/// Scenario 4: EPM canonicalisation in mode BOTH rewrites the read-side IRI
/// and the write side emits only the canonical prefix.
#[test]
fn epm_canonicalisation_both_modes() {
    let mut epm = ExtendedPrefixMap::new();
    epm.add_record(
        PrefixRecord::new("UBERON", "http://purl.obolibrary.org/obo/UBERON_")
            .with_prefix_synonym("https://purl.obolibrary.org/obo/UBERON_"),
    );

    let mut set = MappingSet::new();
    let mut pm = PrefixMap::new();
    pm.insert("UBERON", "http://purl.obolibrary.org/obo/UBERON_");
    set.prefix_map = pm;
    set.mappings = vec![close_match(
        "https://purl.obolibrary.org/obo/UBERON_0000001",
        "https://example.org/OTHER_0001",
    )];

    sssom_core::prefix::epm::apply_to_mapping(&epm, &mut set.mappings[0], EpmMode::Both, true);
    assert_eq!(
        set.mappings[0].subject_id,
        "http://purl.obolibrary.org/obo/UBERON_0000001"
    );

    let config = SssomConfig::default();
    let written = write_mapping_set(&set, &config).unwrap();
    assert!(written.contains("UBERON:0000001"));
    assert!(!written.contains("purl.obolibrary.org"));
}

/// Scenario 5: template expansion with a custom-separator flatten.
#[test]
fn template_expansion_with_flatten() {
    let prefixes = PrefixManager::new();
    let fmt = sssom_core::dsl::formatter::Formatter::new(&prefixes);
    let mut mapping = close_match("https://example.org/A", "https://example.org/B");
    mapping.author_label = vec!["Alice".to_string(), "Bob".to_string()];

    let rendered = fmt
        .format("Authors: %{author_label|flatten(' ', '[', ']')}", &mapping)
        .unwrap();
    assert_eq!(rendered, "Authors: [Alice Bob]");
}

/// Scenario 6: inversion swaps subject/object, negates cardinality, and
/// looks up the inverse predicate.
#[test]
fn inversion_swaps_subject_and_object() {
    let mut mapping = MappingBuilder::new()
        .subject_id("https://example.org/A")
        .predicate_id("http://www.w3.org/2004/02/skos/core#broadMatch")
        .object_id("https://example.org/B")
        .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
        .build()
        .unwrap();
    mapping.subject_label = Some("a".to_string());
    mapping.object_label = Some("b".to_string());
    mapping.mapping_cardinality = Some(Cardinality::OneToMany);

    let mut invertible = IndexMap::new();
    invertible.insert(
        "http://www.w3.org/2004/02/skos/core#broadMatch".to_string(),
        "http://www.w3.org/2004/02/skos/core#narrowMatch".to_string(),
    );

    let inverted = mapping.invert(&invertible, None).expect("predicate is invertible");
    assert_eq!(inverted.subject_id, "https://example.org/B");
    assert_eq!(inverted.object_id, "https://example.org/A");
    assert_eq!(
        inverted.predicate_id,
        "http://www.w3.org/2004/02/skos/core#narrowMatch"
    );
    assert_eq!(inverted.subject_label.as_deref(), Some("b"));
    assert_eq!(inverted.object_label.as_deref(), Some("a"));
    assert_eq!(inverted.mapping_cardinality, Some(Cardinality::ManyToOne));
}

/// A universal property: round-tripping a written set through the reader
/// reproduces it structurally.
#[test]
fn round_trip_through_tsv() {
    let mut set = MappingSet::new();
    let mut pm = PrefixMap::new();
    pm.insert("MONDO", "http://purl.obolibrary.org/obo/MONDO_");
    pm.insert("HP", "http://purl.obolibrary.org/obo/HP_");
    set.prefix_map = pm;
    set.title = Some("Round trip set".to_string());
    set.mappings = vec![MappingBuilder::new()
        .subject_id("http://purl.obolibrary.org/obo/MONDO_0000001")
        .predicate_id("http://www.w3.org/2004/02/skos/core#exactMatch")
        .object_id("http://purl.obolibrary.org/obo/HP_0000001")
        .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
        .build()
        .unwrap()];

    let config = SssomConfig::default();
    let written = write_mapping_set(&set, &config).unwrap();
    let read_back = read_mapping_set(&written, None, None, &config).unwrap();

    assert_eq!(read_back.mappings.len(), set.mappings.len());
    assert_eq!(read_back.mappings[0].subject_id, set.mappings[0].subject_id);
    assert_eq!(read_back.mappings[0].object_id, set.mappings[0].object_id);
    assert_eq!(
        read_back.mappings[0].predicate_id,
        set.mappings[0].predicate_id
    );
    assert_eq!(read_back.title, set.title);
}

//! Serialise a [`MappingSet`] to the framed YAML-plus-TSV wire form.

use super::escape::{escape_scalar, join_list};
use super::YamlNode;
use crate::config::SssomConfig;
use crate::error::Result;
use crate::model::extension::{ExtensionDefinition, ExtensionSlotManager};
use crate::model::mapping::Mapping;
use crate::model::mapping_set::MappingSet;
use crate::model::registry::{mapping_set_header_slot_order, mapping_standard_slot_names, ColumnCollector};
use crate::model::value::SlotValue;
use crate::prefix::PrefixManager;
use tracing::warn;

const EXTENSION_VALUES_SLOT: &str = "extension_values";

/// Serialise `set` to its TSV wire form, applying the writer preconditions
/// of §4.F (default license, synthesised identifier, condensation, used-
/// prefix collection).
///
/// # Errors
/// Returns [`crate::error::SssomError::Prefix`] when `config.strict_unshortenable`
/// is set and an entity-reference IRI cannot be shortened, or a framing
/// error from the underlying `csv` writer.
pub fn write_mapping_set(set: &MappingSet, config: &SssomConfig) -> Result<String> {
    let canon = set.canonicalise_for_write(config.condensation_policy);

    let ext_mgr = effective_extension_manager(&canon);
    let mut ext_defs = ext_mgr.definitions();
    ext_defs.sort_by(|a, b| a.slot_name.cmp(&b.slot_name));

    let mut prefix_mgr = PrefixManager::from_prefix_map(&canon.prefix_map);
    let used = prefix_mgr.used_prefixes(&canon);
    if !prefix_mgr.unshortenable().is_empty() {
        if config.strict_unshortenable {
            if let Some(bad) = prefix_mgr.unshortenable().iter().next() {
                return Err(crate::error::SssomError::prefix_for(
                    "entity-reference IRI could not be shortened",
                    bad.clone(),
                ));
            }
        } else {
            warn!(
                count = prefix_mgr.unshortenable().len(),
                "writing unshortenable entity-reference IRIs in full"
            );
        }
    }

    let header = build_header_node(&canon, &ext_defs, &used);
    let yaml = header.render();
    let mut framed = String::new();
    for line in yaml.lines() {
        framed.push_str("# ");
        framed.push_str(line);
        framed.push('\n');
    }

    let mut collector = ColumnCollector::new();
    for mapping in &canon.mappings {
        collector.observe(mapping);
    }
    let mut columns: Vec<String> = collector
        .columns()
        .into_iter()
        .filter(|name| *name != EXTENSION_VALUES_SLOT)
        .map(str::to_string)
        .collect();
    for def in &ext_defs {
        if canon
            .mappings
            .iter()
            .any(|m| m.extension_values.contains_key(&def.property_iri))
        {
            columns.push(def.slot_name.clone());
        }
    }

    let mut rows: Vec<(&Mapping, Vec<String>)> = canon
        .mappings
        .iter()
        .map(|m| (m, render_row(m, &columns, &ext_defs, &prefix_mgr)))
        .collect();
    if config.sort_on_write {
        rows.sort_by(|a, b| a.0.canonical_sexpr().cmp(&b.0.canonical_sexpr()));
    }

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(vec![]);
    wtr.write_record(&columns)?;
    for (_, row) in &rows {
        wtr.write_record(row)?;
    }
    let body = String::from_utf8(wtr.into_inner().map_err(|e| {
        crate::error::SssomError::format(format!("failed to finish TSV body: {e}"))
    })?)
    .map_err(|e| crate::error::SssomError::format(format!("TSV body was not valid UTF-8: {e}")))?;

    framed.push_str(&body);
    Ok(framed)
}

/// Build the extension manager that will be in effect once the set is
/// written: every declared definition plus one synthesised for each
/// extension value not already covered by a definition.
fn effective_extension_manager(set: &MappingSet) -> ExtensionSlotManager {
    let mut mgr = ExtensionSlotManager::new(set.extension_definitions.clone());
    let standard_names = mapping_standard_slot_names();
    for mapping in &set.mappings {
        for property_iri in mapping.extension_values.keys() {
            if mgr.by_property_iri(property_iri).is_some() {
                continue;
            }
            let slot_name = property_iri
                .rsplit(['/', '#'])
                .next()
                .unwrap_or(property_iri)
                .to_string();
            if standard_names.contains(&slot_name.as_str()) {
                continue;
            }
            mgr.declare(ExtensionDefinition {
                slot_name,
                property_iri: property_iri.clone(),
                type_hint: crate::model::value::ExtensionTypeHint::String,
                type_hint_iri: "xsd:string".to_string(),
            });
        }
    }
    mgr
}

fn render_row(
    mapping: &Mapping,
    columns: &[String],
    ext_defs: &[ExtensionDefinition],
    prefix_mgr: &PrefixManager,
) -> Vec<String> {
    columns
        .iter()
        .map(|name| {
            if let Some(slot) = crate::model::registry::mapping_slot_by_name(name) {
                match (slot.get)(mapping) {
                    None => String::new(),
                    Some(SlotValue::Str(s)) => {
                        if slot.entity_reference {
                            prefix_mgr.try_shorten(&s).unwrap_or(s)
                        } else {
                            escape_scalar(&s)
                        }
                    }
                    Some(SlotValue::StrList(items)) => {
                        let items: Vec<String> = items
                            .iter()
                            .map(|i| {
                                if slot.entity_reference {
                                    prefix_mgr.try_shorten(i).unwrap_or_else(|| i.clone())
                                } else {
                                    escape_scalar(i)
                                }
                            })
                            .collect();
                        join_list(&items)
                    }
                    Some(SlotValue::Double(d)) => d.to_string(),
                    Some(SlotValue::Date(d)) => d.format("%Y-%m-%d").to_string(),
                    Some(SlotValue::Enum(s)) => s,
                    Some(SlotValue::Map(_) | SlotValue::ExtensionDefs(_) | SlotValue::ExtensionMap(_)) => {
                        String::new()
                    }
                }
            } else if let Some(def) = ext_defs.iter().find(|d| &d.slot_name == name) {
                mapping
                    .extension_values
                    .get(&def.property_iri)
                    .map(|v| escape_scalar(&v.to_cell_string()))
                    .unwrap_or_default()
            } else {
                String::new()
            }
        })
        .collect()
}

fn build_header_node(
    set: &MappingSet,
    ext_defs: &[ExtensionDefinition],
    used_prefixes: &std::collections::HashSet<String>,
) -> YamlNode {
    let mut entries = Vec::new();
    for key in mapping_set_header_slot_order() {
        match *key {
            "mapping_set_id" => entries.push((
                "mapping_set_id".to_string(),
                YamlNode::Scalar(set.mapping_set_id.clone()),
            )),
            "mapping_set_version" => {
                if let Some(v) = &set.mapping_set_version {
                    entries.push(("mapping_set_version".to_string(), YamlNode::Scalar(v.clone())));
                }
            }
            "mapping_set_confidence" => {
                if let Some(c) = set.mapping_set_confidence {
                    entries.push((
                        "mapping_set_confidence".to_string(),
                        YamlNode::Scalar(c.to_string()),
                    ));
                }
            }
            "title" => {
                if let Some(v) = &set.title {
                    entries.push(("title".to_string(), YamlNode::Scalar(v.clone())));
                }
            }
            "description" => {
                if let Some(v) = &set.description {
                    entries.push(("description".to_string(), YamlNode::Scalar(v.clone())));
                }
            }
            "license" => entries.push(("license".to_string(), YamlNode::Scalar(set.license.clone()))),
            "publication_date" => {
                if let Some(d) = set.publication_date {
                    entries.push((
                        "publication_date".to_string(),
                        YamlNode::Scalar(d.format("%Y-%m-%d").to_string()),
                    ));
                }
            }
            "curie_map" => {
                let map_entries: Vec<(String, YamlNode)> = set
                    .prefix_map
                    .iter()
                    .filter(|(short, _)| used_prefixes.contains(*short))
                    .map(|(short, prefix)| (short.to_string(), YamlNode::Scalar(prefix.to_string())))
                    .collect();
                entries.push(("curie_map".to_string(), YamlNode::Map(map_entries)));
            }
            "extension_definitions" => {
                if !ext_defs.is_empty() {
                    let list = ext_defs
                        .iter()
                        .map(|d| {
                            YamlNode::Map(vec![
                                ("slot_name".to_string(), YamlNode::Scalar(d.slot_name.clone())),
                                (
                                    "property_iri".to_string(),
                                    YamlNode::Scalar(d.property_iri.clone()),
                                ),
                                (
                                    "type_hint_iri".to_string(),
                                    YamlNode::Scalar(d.type_hint_iri.clone()),
                                ),
                            ])
                        })
                        .collect();
                    entries.push(("extension_definitions".to_string(), YamlNode::List(list)));
                }
            }
            _ => {}
        }
    }
    YamlNode::Map(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mapping::MappingBuilder;
    use crate::model::mapping_set::PrefixMap;
    use crate::model::value::ExtensionValue;

    fn sample_set() -> MappingSet {
        let mut set = MappingSet::new();
        let mut pm = PrefixMap::new();
        pm.insert("MONDO", "http://purl.obolibrary.org/obo/MONDO_");
        pm.insert("HP", "http://purl.obolibrary.org/obo/HP_");
        set.prefix_map = pm;
        set.mappings = vec![MappingBuilder::new()
            .subject_id("http://purl.obolibrary.org/obo/MONDO_0000001")
            .predicate_id("http://www.w3.org/2004/02/skos/core#exactMatch")
            .object_id("http://purl.obolibrary.org/obo/HP_0000001")
            .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
            .build()
            .unwrap()];
        set
    }

    #[test]
    fn write_fills_default_license_and_shortens_entity_references() {
        let set = sample_set();
        let out = write_mapping_set(&set, &SssomConfig::default()).unwrap();
        assert!(out.contains("# license: https://w3id.org/sssom/license/all-rights-reserved"));
        assert!(out.contains("MONDO:0000001"));
        assert!(out.contains("skos:exactMatch"));
    }

    #[test]
    fn write_only_emits_used_prefixes() {
        let mut set = sample_set();
        set.prefix_map.insert("UNUSED", "https://example.org/unused/");
        let out = write_mapping_set(&set, &SssomConfig::default()).unwrap();
        assert!(!out.contains("UNUSED"));
    }

    #[test]
    fn header_row_follows_slot_declaration_order() {
        let set = sample_set();
        let out = write_mapping_set(&set, &SssomConfig::default()).unwrap();
        let header_line = out.lines().find(|l| l.starts_with("subject_id")).unwrap();
        let subj_idx = header_line.find("subject_id").unwrap();
        let pred_idx = header_line.find("predicate_id").unwrap();
        assert!(subj_idx < pred_idx);
    }

    #[test]
    fn extension_values_get_their_own_column_and_definition() {
        let mut set = sample_set();
        set.mappings[0].extension_values.insert(
            "https://example.org/ext/score".to_string(),
            ExtensionValue::Double(0.9),
        );
        let out = write_mapping_set(&set, &SssomConfig::default()).unwrap();
        assert!(out.contains("slot_name: score"));
        let header_line = out
            .lines()
            .find(|l| l.starts_with("subject_id"))
            .expect("tsv header row");
        assert!(header_line.contains("score"));
        assert!(!header_line.contains("extension_values"));
    }
}

//! Parse the framed YAML-plus-TSV wire form into a [`MappingSet`].

use super::escape::{split_list, unescape_scalar};
use crate::config::{EpmMode, SssomConfig};
use crate::error::{Result, SssomError};
use crate::model::extension::{is_valid_extension_name, ExtensionDefinition, ExtensionSlotManager};
use crate::model::mapping::Mapping;
use crate::model::mapping_set::{MappingSet, PrefixMap};
use crate::model::registry::{mapping_slot_by_name, mapping_standard_slot_names};
use crate::model::slot::ValueType;
use crate::model::value::{ExtensionTypeHint, ExtensionValue, SlotValue};
use crate::prefix::{ExtendedPrefixMap, PrefixManager};
use chrono::NaiveDate;
use serde_yaml::Value as Yaml;
use tracing::warn;

/// Raw text of a sibling `.sssom.yml` metadata file, used when the TSV body
/// carries no `#`-prefixed front matter of its own.
#[derive(Debug, Clone)]
pub struct ExternalMetadata(pub String);

/// Parse `content` (a whole TSV file, front matter plus body) into a
/// [`MappingSet`].
///
/// `epm` optionally applies Extended Prefix Map canonicalisation in `PRE`
/// or `BOTH` mode as each mapping's entity-reference IRIs are resolved.
///
/// # Errors
/// Returns [`SssomError::Format`] for malformed YAML/TSV framing or an
/// out-of-range numeric slot, and [`SssomError::Prefix`] for an undeclared
/// CURIE prefix.
pub fn read_mapping_set(
    content: &str,
    external_metadata: Option<&ExternalMetadata>,
    epm: Option<(&ExtendedPrefixMap, EpmMode)>,
    config: &SssomConfig,
) -> Result<MappingSet> {
    let (yaml_text, body) = split_front_matter(content);
    let yaml_text = if yaml_text.trim().is_empty() {
        external_metadata.map(|m| m.0.clone()).unwrap_or_default()
    } else {
        yaml_text
    };

    let yaml: Yaml = if yaml_text.trim().is_empty() {
        Yaml::Mapping(serde_yaml::Mapping::new())
    } else {
        serde_yaml::from_str(&yaml_text)?
    };

    let mut set = MappingSet::new();
    set.mapping_set_id = yaml_str(&yaml, "mapping_set_id").unwrap_or_default();
    set.mapping_set_version = yaml_str(&yaml, "mapping_set_version");
    set.mapping_set_confidence = yaml_f64(&yaml, "mapping_set_confidence");
    set.title = yaml_str(&yaml, "title");
    set.description = yaml_str(&yaml, "description");
    set.license = yaml_str(&yaml, "license").unwrap_or_default();
    set.publication_date = yaml_str(&yaml, "publication_date")
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());
    set.prefix_map = yaml_curie_map(&yaml);
    set.extension_definitions = yaml_extension_definitions(&yaml);

    let mut prefix_mgr = PrefixManager::from_prefix_map(&set.prefix_map);
    let mut ext_mgr = ExtensionSlotManager::new(set.extension_definitions.clone());
    let standard_names = mapping_standard_slot_names();

    if body.trim().is_empty() {
        return Ok(set);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(false)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(std::string::ToString::to_string)
        .collect();

    let mut mappings = Vec::new();
    let mut prefix_errors: Vec<String> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let mut mapping = Mapping::default();
        for (i, cell) in record.iter().enumerate() {
            let Some(column) = headers.get(i) else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            match set_cell(
                &mut mapping,
                column,
                cell,
                &mut prefix_mgr,
                &mut ext_mgr,
                &standard_names,
                config,
            ) {
                Ok(()) => {}
                Err(SssomError::Prefix { message, value }) if !is_mandatory_entity_slot(column) => {
                    warn!(column, cell, "deferring prefix error to end of file");
                    prefix_errors.push(match value {
                        Some(v) => format!("column {column}: {message}: {v}"),
                        None => format!("column {column}: {message}"),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        if let Some((epm_table, mode)) = epm {
            crate::prefix::epm::apply_to_mapping(epm_table, &mut mapping, mode, true);
        }
        mappings.push(mapping);
    }
    if !prefix_errors.is_empty() {
        return Err(SssomError::prefix(format!(
            "{} prefix error(s) found while reading: {}",
            prefix_errors.len(),
            prefix_errors.join("; ")
        )));
    }
    set.mappings = mappings;
    set.extension_definitions = ext_mgr.definitions();

    Ok(set)
}

/// Whether `column` names a mandatory entity-reference slot, where an
/// undeclared prefix would silently lose the slot rather than merely
/// producing a bad value — these fail immediately rather than being
/// deferred to end-of-file (`spec.md` §7).
fn is_mandatory_entity_slot(column: &str) -> bool {
    matches!(
        column,
        "subject_id" | "predicate_id" | "object_id" | "mapping_justification"
    )
}

fn set_cell(
    mapping: &mut Mapping,
    column: &str,
    cell: &str,
    prefix_mgr: &mut PrefixManager,
    ext_mgr: &mut ExtensionSlotManager,
    standard_names: &[&str],
    config: &SssomConfig,
) -> Result<()> {
    if let Some(slot) = mapping_slot_by_name(column) {
        let value = cell_to_slot_value(cell, slot.value_type, slot.entity_reference, prefix_mgr)?;
        (slot.set)(mapping, Some(value))
            .map_err(|msg| SssomError::format_at(msg, format!("column {column}")))?;
        return Ok(());
    }

    if !is_valid_extension_name(column, standard_names) {
        return Ok(());
    }
    let Some(def) = ext_mgr.resolve_on_read(column, config.extension_policy, standard_names) else {
        return Ok(());
    };
    let value = ExtensionValue::parse(cell, def.type_hint)
        .map_err(|e| SssomError::format_at(e, format!("column {column}")))?;
    mapping.extension_values.insert(def.property_iri, value);
    Ok(())
}

fn cell_to_slot_value(
    cell: &str,
    value_type: ValueType,
    entity_reference: bool,
    prefix_mgr: &PrefixManager,
) -> Result<SlotValue> {
    match value_type {
        ValueType::String => {
            let raw = unescape_scalar(cell);
            let resolved = if entity_reference {
                prefix_mgr.expand(&raw)?
            } else {
                raw
            };
            Ok(SlotValue::Str(resolved))
        }
        ValueType::ListOfString => {
            let items = split_list(cell)
                .into_iter()
                .map(|item| {
                    if entity_reference {
                        prefix_mgr.expand(&item)
                    } else {
                        Ok(unescape_scalar(&item))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(SlotValue::StrList(items))
        }
        ValueType::Enum => Ok(SlotValue::Enum(cell.trim().to_string())),
        ValueType::Double => cell
            .trim()
            .parse::<f64>()
            .map(SlotValue::Double)
            .map_err(|e| SssomError::format(format!("invalid numeric cell {cell:?}: {e}"))),
        ValueType::Date => NaiveDate::parse_from_str(cell.trim(), "%Y-%m-%d")
            .map(SlotValue::Date)
            .map_err(|e| SssomError::format(format!("invalid date cell {cell:?}: {e}"))),
        ValueType::Map | ValueType::ExtensionDefinitionList | ValueType::ExtensionValueMap => {
            Err(SssomError::format(format!(
                "slot of type {value_type:?} is not a plain TSV cell"
            )))
        }
    }
}

/// Split `content` into the YAML front matter (concatenated, `#`-prefix
/// stripped) and the remaining TSV body.
fn split_front_matter(content: &str) -> (String, String) {
    let mut yaml_lines = Vec::new();
    let mut body_start = 0;
    for (i, line) in content.lines().enumerate() {
        if let Some(rest) = line.strip_prefix("# ") {
            yaml_lines.push(rest);
        } else if let Some(rest) = line.strip_prefix('#') {
            yaml_lines.push(rest);
        } else {
            body_start = i;
            break;
        }
        body_start = i + 1;
    }
    let body: String = content
        .lines()
        .skip(body_start)
        .collect::<Vec<_>>()
        .join("\n");
    (yaml_lines.join("\n"), body)
}

/// Look up `key` in a YAML mapping by scanning its entries, sidestepping
/// any version-specific generic-index API on `serde_yaml::Mapping`.
fn yaml_get<'a>(mapping: &'a serde_yaml::Mapping, key: &str) -> Option<&'a Yaml> {
    mapping
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn yaml_str(yaml: &Yaml, key: &str) -> Option<String> {
    yaml_get(yaml.as_mapping()?, key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn yaml_f64(yaml: &Yaml, key: &str) -> Option<f64> {
    yaml_get(yaml.as_mapping()?, key).and_then(serde_yaml::Value::as_f64)
}

fn yaml_curie_map(yaml: &Yaml) -> PrefixMap {
    let mut map = PrefixMap::new();
    if let Some(entries) = yaml
        .as_mapping()
        .and_then(|m| yaml_get(m, "curie_map"))
        .and_then(|v| v.as_mapping())
    {
        for (k, v) in entries {
            if let (Some(k), Some(v)) = (k.as_str(), v.as_str()) {
                map.insert(k, v);
            }
        }
    }
    map
}

fn yaml_extension_definitions(yaml: &Yaml) -> Vec<ExtensionDefinition> {
    let Some(list) = yaml
        .as_mapping()
        .and_then(|m| yaml_get(m, "extension_definitions"))
        .and_then(|v| v.as_sequence())
    else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|entry| {
            let m = entry.as_mapping()?;
            let slot_name = yaml_get(m, "slot_name")?.as_str()?.to_string();
            let property_iri = yaml_get(m, "property_iri")?.as_str()?.to_string();
            let type_hint_iri = yaml_get(m, "type_hint_iri")
                .and_then(|v| v.as_str())
                .unwrap_or("xsd:string")
                .to_string();
            Some(ExtensionDefinition {
                slot_name,
                property_iri,
                type_hint: type_hint_from_iri(&type_hint_iri),
                type_hint_iri,
            })
        })
        .collect()
}

fn type_hint_from_iri(iri: &str) -> ExtensionTypeHint {
    match iri {
        "xsd:boolean" => ExtensionTypeHint::Boolean,
        "xsd:integer" | "xsd:int" => ExtensionTypeHint::Integer,
        "xsd:double" | "xsd:float" | "xsd:decimal" => ExtensionTypeHint::Double,
        "xsd:date" => ExtensionTypeHint::Date,
        "xsd:dateTime" => ExtensionTypeHint::DateTime,
        "xsd:anyURI" => ExtensionTypeHint::Uri,
        "sssom:identifier" => ExtensionTypeHint::Identifier,
        "xsd:string" => ExtensionTypeHint::String,
        _ => ExtensionTypeHint::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# mapping_set_id: https://example.org/set1\n\
# license: https://w3id.org/sssom/license/all-rights-reserved\n\
# curie_map:\n\
#   MONDO: http://purl.obolibrary.org/obo/MONDO_\n\
#   HP: http://purl.obolibrary.org/obo/HP_\n\
subject_id\tpredicate_id\tobject_id\tmapping_justification\n\
MONDO:0000001\tskos:exactMatch\tHP:0000001\tsemapv:ManualMappingCuration\n";

    #[test]
    fn reads_header_and_expands_curies() {
        let cfg = SssomConfig::default();
        let set = read_mapping_set(SAMPLE, None, None, &cfg).unwrap();
        assert_eq!(set.mapping_set_id, "https://example.org/set1");
        assert_eq!(set.mappings.len(), 1);
        assert_eq!(
            set.mappings[0].subject_id,
            "http://purl.obolibrary.org/obo/MONDO_0000001"
        );
        assert_eq!(
            set.mappings[0].predicate_id,
            "http://www.w3.org/2004/02/skos/core#exactMatch"
        );
    }

    #[test]
    fn accumulates_prefix_errors_on_optional_slots_across_rows() {
        let content = "# mapping_set_id: https://example.org/set1\n\
# license: https://w3id.org/sssom/license/all-rights-reserved\n\
# curie_map:\n\
#   MONDO: http://purl.obolibrary.org/obo/MONDO_\n\
#   HP: http://purl.obolibrary.org/obo/HP_\n\
subject_id\tpredicate_id\tobject_id\tmapping_justification\tauthor_id\n\
MONDO:0000001\tskos:exactMatch\tHP:0000001\tsemapv:ManualMappingCuration\tBAD:1\n\
MONDO:0000002\tskos:exactMatch\tHP:0000002\tsemapv:ManualMappingCuration\tBAD:2\n";
        let cfg = SssomConfig::default();
        let err = read_mapping_set(content, None, None, &cfg).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("2 prefix error(s)"), "{message}");
        assert!(message.contains("BAD:1") && message.contains("BAD:2"), "{message}");
    }

    #[test]
    fn rejects_undeclared_prefix() {
        let bad = SAMPLE.replace("MONDO:0000001", "UNKNOWN:1");
        let cfg = SssomConfig::default();
        assert!(read_mapping_set(&bad, None, None, &cfg).is_err());
    }

    #[test]
    fn recognises_extension_columns_under_undefined_policy() {
        let content = "# mapping_set_id: https://example.org/set1\n\
# license: https://w3id.org/sssom/license/all-rights-reserved\n\
# curie_map:\n\
#   MONDO: http://purl.obolibrary.org/obo/MONDO_\n\
#   HP: http://purl.obolibrary.org/obo/HP_\n\
subject_id\tpredicate_id\tobject_id\tmapping_justification\text_score\n\
MONDO:0000001\tskos:exactMatch\tHP:0000001\tsemapv:ManualMappingCuration\t0.9\n";
        let cfg = SssomConfig::default();
        let set = read_mapping_set(content, None, None, &cfg).unwrap();
        let value = set.mappings[0]
            .extension_values
            .get("https://w3id.org/sssom/ext/ext_score")
            .unwrap();
        assert_eq!(value.to_cell_string(), "0.9");
    }

    #[test]
    fn round_trips_through_write_and_read() {
        use crate::model::mapping::MappingBuilder;
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

        let cfg = SssomConfig::default();
        let written = super::super::writer::write_mapping_set(&set, &cfg).unwrap();
        let read_back = read_mapping_set(&written, None, None, &cfg).unwrap();
        assert_eq!(read_back.mappings.len(), 1);
        assert_eq!(read_back.mappings[0].subject_id, set.mappings[0].subject_id);
        assert_eq!(read_back.license, set.license);
    }
}

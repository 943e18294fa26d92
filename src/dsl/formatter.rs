//! Mapping Formatter: template expansion for generator/callback actions
//! (component J).
//!
//! Modelled after `linkml-service::expression::functions`'s dispatch-by-name
//! style: each modifier is a small named transform threaded through a chain,
//! rather than a single monolithic format routine.

use crate::error::{Result, SssomError};
use crate::model::mapping::Mapping;
use crate::model::registry::mapping_slot_by_name;
use crate::model::value::SlotValue;
use crate::prefix::manager::PrefixManager;

/// A placeholder's value while it is still being run through its modifier
/// chain. Collapses to a single string at the end of expansion (or earlier,
/// via `flatten`/`list_item`).
enum FormatValue {
    Scalar(String),
    List(Vec<String>),
}

impl FormatValue {
    fn finish(self) -> String {
        match self {
            Self::Scalar(s) => s,
            Self::List(items) => items.join(", "),
        }
    }
}

/// Expands `%slot` and `%{slot|modifier|modifier(args)}` placeholders
/// against a [`Mapping`].
pub struct Formatter<'a> {
    prefixes: &'a PrefixManager,
}

impl<'a> Formatter<'a> {
    #[must_use]
    pub fn new(prefixes: &'a PrefixManager) -> Self {
        Self { prefixes }
    }

    /// Expand every placeholder in `template` against `mapping`.
    ///
    /// # Errors
    /// Returns [`SssomError::DslRuntime`] for an unknown slot, a modifier
    /// applied to a value shape it does not support, or an out-of-range
    /// `list_item` index.
    pub fn format(&self, template: &str, mapping: &Mapping) -> Result<String> {
        let mut out = String::new();
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some('{') => {
                    chars.next();
                    let mut inner = String::new();
                    for ch in chars.by_ref() {
                        if ch == '}' {
                            break;
                        }
                        inner.push(ch);
                    }
                    out.push_str(&self.expand_placeholder(inner.trim(), mapping)?);
                }
                Some(_) => {
                    let mut name = String::new();
                    while let Some(&c2) = chars.peek() {
                        if c2.is_ascii_alphanumeric() || c2 == '_' {
                            name.push(c2);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(&self.expand_placeholder(&name, mapping)?);
                }
                None => out.push('%'),
            }
        }
        Ok(out)
    }

    /// `format`, then wrap the whole result in `wrap` (a template containing
    /// one `%s`) if given — the CURIE-embedding form used to produce e.g.
    /// `<%s>` IRI literals.
    ///
    /// # Errors
    /// As [`Self::format`].
    pub fn format_wrapped(
        &self,
        template: &str,
        mapping: &Mapping,
        wrap: Option<&str>,
    ) -> Result<String> {
        let expanded = self.format(template, mapping)?;
        Ok(match wrap {
            Some(w) => w.replacen("%s", &expanded, 1),
            None => expanded,
        })
    }

    fn expand_placeholder(&self, spec: &str, mapping: &Mapping) -> Result<String> {
        let mut parts = spec.split('|');
        let placeholder = parts
            .next()
            .ok_or_else(|| SssomError::dsl_runtime("empty placeholder"))?
            .trim();
        let mut value = self.resolve_placeholder(placeholder, mapping)?;
        for modifier in parts {
            value = self.apply_modifier(modifier.trim(), value)?;
        }
        Ok(value.finish())
    }

    fn resolve_placeholder(&self, placeholder: &str, mapping: &Mapping) -> Result<FormatValue> {
        if placeholder.contains("://") {
            return Ok(match mapping.extension_values.get(placeholder) {
                Some(ev) => FormatValue::Scalar(ev.to_cell_string()),
                None => FormatValue::Scalar(String::new()),
            });
        }
        let slot = mapping_slot_by_name(placeholder)
            .ok_or_else(|| SssomError::dsl_runtime(format!("unknown slot: {placeholder}")))?;
        Ok(match (slot.get)(mapping) {
            None => FormatValue::Scalar(String::new()),
            Some(SlotValue::Str(s) | SlotValue::Enum(s)) => FormatValue::Scalar(s),
            Some(SlotValue::StrList(items)) => FormatValue::List(items),
            Some(SlotValue::Double(d)) => FormatValue::Scalar(d.to_string()),
            Some(SlotValue::Date(d)) => FormatValue::Scalar(d.format("%Y-%m-%d").to_string()),
            Some(SlotValue::Map(_))
            | Some(SlotValue::ExtensionDefs(_))
            | Some(SlotValue::ExtensionMap(_)) => {
                return Err(SssomError::dsl_runtime(format!(
                    "slot {placeholder} cannot be used in a format template"
                )))
            }
        })
    }

    fn apply_modifier(&self, modifier: &str, value: FormatValue) -> Result<FormatValue> {
        let (name, args) = parse_call(modifier);
        match name.as_str() {
            "short" => Ok(match value {
                FormatValue::Scalar(s) => FormatValue::Scalar(self.shorten(&s)),
                FormatValue::List(items) => {
                    FormatValue::List(items.iter().map(|i| self.shorten(i)).collect())
                }
            }),
            "flatten" => {
                let items = expect_list(value, "flatten")?;
                let sep = args.first().map_or(", ", String::as_str);
                let open = args.get(1).map_or("", String::as_str);
                let close = args.get(2).map_or("", String::as_str);
                Ok(FormatValue::Scalar(format!(
                    "{open}{}{close}",
                    items.join(sep)
                )))
            }
            "list_item" => {
                let items = expect_list(value, "list_item")?;
                let index: usize = args
                    .first()
                    .ok_or_else(|| SssomError::dsl_runtime("list_item() requires an index"))?
                    .parse()
                    .map_err(|_| SssomError::dsl_runtime("list_item() index is not a number"))?;
                let item = index
                    .checked_sub(1)
                    .and_then(|i| items.get(i))
                    .ok_or_else(|| SssomError::dsl_runtime(format!("list_item({index}) out of range")))?;
                Ok(FormatValue::Scalar(item.clone()))
            }
            other => Err(SssomError::dsl_runtime(format!("unknown formatter modifier: {other}"))),
        }
    }

    fn shorten(&self, iri: &str) -> String {
        self.prefixes
            .try_shorten(iri)
            .unwrap_or_else(|| iri.to_string())
    }
}

fn expect_list(value: FormatValue, modifier: &str) -> Result<Vec<String>> {
    match value {
        FormatValue::List(items) => Ok(items),
        FormatValue::Scalar(_) => Err(SssomError::dsl_runtime(format!(
            "{modifier}() only applies to a list-valued slot"
        ))),
    }
}

/// Parse `name` or `name(a,b,c)` into a name and its comma-separated,
/// trimmed arguments.
fn parse_call(segment: &str) -> (String, Vec<String>) {
    match segment.split_once('(') {
        Some((name, rest)) => {
            let args = rest.trim_end_matches(')');
            let parsed = if args.is_empty() {
                Vec::new()
            } else {
                args.split(',').map(|a| a.trim().to_string()).collect()
            };
            (name.trim().to_string(), parsed)
        }
        None => (segment.trim().to_string(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mapping::MappingBuilder;

    fn sample() -> Mapping {
        let mut m = MappingBuilder::new()
            .subject_id("http://purl.obolibrary.org/obo/UBERON_0000001")
            .predicate_id("http://www.w3.org/2004/02/skos/core#exactMatch")
            .object_id("https://example.org/OTHER_0011")
            .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
            .build()
            .unwrap();
        m.author_label = vec!["Alice".to_string(), "Bob".to_string()];
        m
    }

    #[test]
    fn raw_placeholder_substitutes_directly() {
        let prefixes = PrefixManager::new();
        let fmt = Formatter::new(&prefixes);
        assert_eq!(
            fmt.format("%subject_id", &sample()).unwrap(),
            "http://purl.obolibrary.org/obo/UBERON_0000001"
        );
    }

    #[test]
    fn short_modifier_shortens_to_a_curie() {
        let mut pm = PrefixManager::new();
        let mut map = crate::model::mapping_set::PrefixMap::new();
        map.insert("UBERON", "http://purl.obolibrary.org/obo/UBERON_");
        pm.merge(&map, true);
        let fmt = Formatter::new(&pm);
        assert_eq!(
            fmt.format("%{subject_id|short}", &sample()).unwrap(),
            "UBERON:0000001"
        );
    }

    #[test]
    fn flatten_joins_a_list_slot_with_defaults() {
        let prefixes = PrefixManager::new();
        let fmt = Formatter::new(&prefixes);
        assert_eq!(
            fmt.format("%{author_label|flatten}", &sample()).unwrap(),
            "Alice, Bob"
        );
    }

    #[test]
    fn flatten_accepts_custom_separator_and_wrap() {
        let prefixes = PrefixManager::new();
        let fmt = Formatter::new(&prefixes);
        assert_eq!(
            fmt.format("%{author_label|flatten(;, [, ])}", &sample()).unwrap(),
            "[Alice; Bob]"
        );
    }

    #[test]
    fn list_item_selects_one_based_index() {
        let prefixes = PrefixManager::new();
        let fmt = Formatter::new(&prefixes);
        assert_eq!(
            fmt.format("%{author_label|list_item(2)}", &sample()).unwrap(),
            "Bob"
        );
    }

    #[test]
    fn wrap_embeds_the_expansion_in_angle_brackets() {
        let prefixes = PrefixManager::new();
        let fmt = Formatter::new(&prefixes);
        assert_eq!(
            fmt.format_wrapped("%object_id", &sample(), Some("<%s>")).unwrap(),
            "<https://example.org/OTHER_0011>"
        );
    }
}

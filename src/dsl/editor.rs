//! Mapping Editor primitives: `assign`, `edit`, `replace` (component J).

use crate::error::{Result, SssomError};
use crate::model::mapping::Mapping;
use crate::model::registry::mapping_slot_by_name;
use crate::model::value::SlotValue;
use crate::prefix::manager::PrefixManager;
use regex::Regex;

/// Slots a valid mapping can never be without; `assign`/`edit` refuse to
/// clear them rather than silently producing an invalid mapping.
const MANDATORY_SLOTS: &[&str] = &[
    "subject_id",
    "predicate_id",
    "object_id",
    "mapping_justification",
];

/// Applies `assign`/`edit`/`replace` actions to a [`Mapping`] in place,
/// against the slot registry (component C). Holds a [`PrefixManager`]
/// reference so CURIE literals assigned to entity-reference slots expand
/// to full IRIs the same way the filter evaluator does.
pub struct MappingEditor<'a> {
    prefixes: &'a PrefixManager,
}

impl<'a> MappingEditor<'a> {
    #[must_use]
    pub fn new(prefixes: &'a PrefixManager) -> Self {
        Self { prefixes }
    }

    /// `assign(slot, literal)`. An empty or absent `literal` deletes the
    /// slot's value, unless `slot_name` is mandatory.
    ///
    /// # Errors
    /// Returns [`SssomError::DslRuntime`] for an unknown slot, an attempt to
    /// clear a mandatory slot, or a literal that does not parse as the
    /// slot's value type.
    pub fn assign(&self, mapping: &mut Mapping, slot_name: &str, literal: &str) -> Result<()> {
        let slot = mapping_slot_by_name(slot_name)
            .ok_or_else(|| SssomError::dsl_runtime(format!("unknown slot: {slot_name}")))?;

        if literal.is_empty() {
            if MANDATORY_SLOTS.contains(&slot_name) {
                return Err(SssomError::dsl_runtime(format!(
                    "cannot clear mandatory slot {slot_name}"
                )));
            }
            return (slot.set)(mapping, None).map_err(SssomError::dsl_runtime);
        }

        let value = if slot.entity_reference {
            SlotValue::Str(self.prefixes.expand(literal)?)
        } else {
            parse_literal(slot.value_type, literal)?
        };
        (slot.set)(mapping, Some(value)).map_err(SssomError::dsl_runtime)
    }

    /// `edit("slot=value")`, the single-string form of [`Self::assign`].
    ///
    /// # Errors
    /// Returns [`SssomError::DslRuntime`] if `expr` has no `=`, or for any
    /// reason [`Self::assign`] would.
    pub fn edit(&self, mapping: &mut Mapping, expr: &str) -> Result<()> {
        let (slot_name, literal) = expr
            .split_once('=')
            .ok_or_else(|| SssomError::dsl_runtime(format!("edit() expression '{expr}' is missing '='")))?;
        self.assign(mapping, slot_name.trim(), literal.trim())
    }

    /// `replace(slot, pattern, replacement)`. Applies a regex substitution
    /// to a string slot, or to every element of a list slot.
    ///
    /// # Errors
    /// Returns [`SssomError::DslRuntime`] for an unknown slot or a slot
    /// whose value type `replace` does not support, and propagates a
    /// malformed `pattern`.
    pub fn replace(
        &self,
        mapping: &mut Mapping,
        slot_name: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<()> {
        let slot = mapping_slot_by_name(slot_name)
            .ok_or_else(|| SssomError::dsl_runtime(format!("unknown slot: {slot_name}")))?;
        let re = Regex::new(pattern)?;
        let current = (slot.get)(mapping);
        let updated = match current {
            None => None,
            Some(SlotValue::Str(s)) => Some(SlotValue::Str(re.replace_all(&s, replacement).into_owned())),
            Some(SlotValue::Enum(s)) => Some(SlotValue::Enum(re.replace_all(&s, replacement).into_owned())),
            Some(SlotValue::StrList(items)) => Some(SlotValue::StrList(
                items
                    .iter()
                    .map(|item| re.replace_all(item, replacement).into_owned())
                    .collect(),
            )),
            Some(_) => {
                return Err(SssomError::dsl_runtime(format!(
                    "replace() does not support slot {slot_name}'s value type"
                )))
            }
        };
        (slot.set)(mapping, updated).map_err(SssomError::dsl_runtime)
    }
}

fn parse_literal(value_type: crate::model::slot::ValueType, literal: &str) -> Result<SlotValue> {
    use crate::model::slot::ValueType;
    match value_type {
        ValueType::String => Ok(SlotValue::Str(literal.to_string())),
        ValueType::Enum => Ok(SlotValue::Enum(literal.to_string())),
        ValueType::ListOfString => Ok(SlotValue::StrList(
            literal.split('|').map(str::to_string).collect(),
        )),
        ValueType::Double => literal
            .parse::<f64>()
            .map(SlotValue::Double)
            .map_err(|_| SssomError::dsl_runtime(format!("'{literal}' is not a number"))),
        ValueType::Date => chrono::NaiveDate::parse_from_str(literal, "%Y-%m-%d")
            .map(SlotValue::Date)
            .map_err(|_| SssomError::dsl_runtime(format!("'{literal}' is not a YYYY-MM-DD date"))),
        ValueType::Map | ValueType::ExtensionDefinitionList | ValueType::ExtensionValueMap => Err(
            SssomError::dsl_runtime("assign()/edit() cannot target a structured slot"),
        ),
    }
}

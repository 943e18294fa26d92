//! Compiles and evaluates parsed [`Filter`] trees against a [`Mapping`]
//! (component I).
//!
//! Grounded on `linkml-service::rule_engine::matcher`'s compiled-condition
//! idiom: each atom is evaluated directly against the slot registry rather
//! than compiled to a closure up front, since `Mapping` values here are
//! cheap to re-read per rule application.

use super::ast::{Call, CompareOp, Filter, FilterValue, SlotPredicate};
use super::FunctionTable;
use crate::error::{Result, SssomError};
use crate::model::mapping::Mapping;
use crate::model::registry::mapping_slot_by_name;
use crate::model::slot::ValueType;
use crate::model::value::SlotValue;
use regex::Regex;

/// Map the filter-only subject/predicate/object shorthand (used throughout
/// `spec.md` §8's scenarios, e.g. `subject==*`) onto the real `_id` slot.
fn resolve_slot_alias(name: &str) -> &str {
    match name {
        "subject" => "subject_id",
        "predicate" => "predicate_id",
        "object" => "object_id",
        other => other,
    }
}

/// Translate a `*`-glob pattern into an anchored regex and test `text`
/// against it.
fn glob_match(pattern: &str, text: &str) -> Result<bool> {
    let parts: Vec<String> = pattern.split('*').map(regex::escape).collect();
    let re = Regex::new(&format!("^{}$", parts.join(".*")))?;
    Ok(re.is_match(text))
}

impl Filter {
    /// Evaluate this filter tree against `mapping`.
    ///
    /// # Errors
    /// Returns [`SssomError::DslRuntime`] when an application filter is not
    /// registered in `table`, a predicate targets a slot of a type that does
    /// not support the requested operator, or a numeric comparison's
    /// pattern does not parse as a number.
    pub fn evaluate(&self, mapping: &Mapping, table: &FunctionTable) -> Result<bool> {
        match self {
            Self::Or(a, b) => Ok(a.evaluate(mapping, table)? || b.evaluate(mapping, table)?),
            Self::And(a, b) => Ok(a.evaluate(mapping, table)? && b.evaluate(mapping, table)?),
            Self::Not(inner) => Ok(!inner.evaluate(mapping, table)?),
            Self::Slot(pred) => evaluate_slot_predicate(pred, mapping),
            Self::Application(call) => evaluate_application(call, mapping, table),
        }
    }
}

fn evaluate_application(call: &Call, mapping: &Mapping, table: &FunctionTable) -> Result<bool> {
    if call.name == "is_missing" {
        return Ok(mapping.is_missing());
    }
    let args: Vec<super::ast::ArgValue> = call.args.clone();
    table.call_app_filter(&call.name, mapping, &args, &call.kwargs)
}

fn evaluate_slot_predicate(pred: &SlotPredicate, mapping: &Mapping) -> Result<bool> {
    let name = resolve_slot_alias(&pred.slot);
    let slot = mapping_slot_by_name(name)
        .ok_or_else(|| SssomError::dsl_runtime(format!("unknown slot in filter: {name}")))?;
    let value = (slot.get)(mapping);

    match &pred.value {
        FilterValue::Absent | FilterValue::Empty => Ok(value.is_none()),
        FilterValue::Wildcard => Ok(value.is_some()),
        FilterValue::Pattern(pattern) => match (slot.value_type, &value) {
            (ValueType::Double, maybe) => evaluate_numeric(pred.op, pattern, maybe.as_ref()),
            (ValueType::String | ValueType::Enum, maybe) => {
                require_eq(pred.op)?;
                match maybe {
                    Some(SlotValue::Str(s) | SlotValue::Enum(s)) => glob_match(pattern, s),
                    _ => Ok(false),
                }
            }
            (ValueType::ListOfString, maybe) => {
                require_eq(pred.op)?;
                match maybe {
                    Some(SlotValue::StrList(items)) => {
                        for item in items {
                            if glob_match(pattern, item)? {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    }
                    _ => Ok(false),
                }
            }
            (ValueType::Date, maybe) => {
                require_eq(pred.op)?;
                match maybe {
                    Some(SlotValue::Date(d)) => Ok(d.format("%Y-%m-%d").to_string() == *pattern),
                    _ => Ok(false),
                }
            }
            (ValueType::Map | ValueType::ExtensionDefinitionList | ValueType::ExtensionValueMap, _) => {
                Err(SssomError::dsl_runtime(format!(
                    "slot {name} does not support a filter predicate"
                )))
            }
        },
    }
}

fn require_eq(op: CompareOp) -> Result<()> {
    if op == CompareOp::Eq {
        Ok(())
    } else {
        Err(SssomError::dsl_runtime(
            "only == is supported for non-numeric slots",
        ))
    }
}

fn evaluate_numeric(op: CompareOp, pattern: &str, value: Option<&SlotValue>) -> Result<bool> {
    let Some(SlotValue::Double(actual)) = value else {
        return Ok(false);
    };
    let expected: f64 = pattern
        .parse()
        .map_err(|_| SssomError::dsl_runtime(format!("'{pattern}' is not a number")))?;
    Ok(match op {
        CompareOp::Eq => (*actual - expected).abs() < f64::EPSILON,
        CompareOp::Ge => *actual >= expected,
        CompareOp::Le => *actual <= expected,
        CompareOp::Gt => *actual > expected,
        CompareOp::Lt => *actual < expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mapping::MappingBuilder;

    fn sample() -> Mapping {
        MappingBuilder::new()
            .subject_id("https://example.org/ORG_0001")
            .predicate_id("http://www.w3.org/2004/02/skos/core#exactMatch")
            .object_id("https://example.org/OTHER_0011")
            .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
            .build()
            .unwrap()
    }

    #[test]
    fn wildcard_matches_any_present_value() {
        let pred = SlotPredicate {
            slot: "subject".to_string(),
            op: CompareOp::Eq,
            value: FilterValue::Wildcard,
        };
        assert!(evaluate_slot_predicate(&pred, &sample()).unwrap());
    }

    #[test]
    fn absent_matches_missing_optional_slot() {
        let pred = SlotPredicate {
            slot: "comment".to_string(),
            op: CompareOp::Eq,
            value: FilterValue::Absent,
        };
        assert!(evaluate_slot_predicate(&pred, &sample()).unwrap());
    }

    #[test]
    fn pattern_glob_matches_entity_reference() {
        let pred = SlotPredicate {
            slot: "subject".to_string(),
            op: CompareOp::Eq,
            value: FilterValue::Pattern("https://example.org/ORG_*".to_string()),
        };
        assert!(evaluate_slot_predicate(&pred, &sample()).unwrap());
    }

    #[test]
    fn numeric_comparison_respects_operator() {
        let mut m = sample();
        m.confidence = Some(0.9);
        let pred = SlotPredicate {
            slot: "confidence".to_string(),
            op: CompareOp::Ge,
            value: FilterValue::Pattern("0.8".to_string()),
        };
        assert!(evaluate_slot_predicate(&pred, &m).unwrap());
    }

    #[test]
    fn and_or_not_combine() {
        let table = FunctionTable::new();
        let f = Filter::Not(Box::new(Filter::Slot(SlotPredicate {
            slot: "predicate".to_string(),
            op: CompareOp::Eq,
            value: FilterValue::Pattern(
                "http://www.w3.org/2004/02/skos/core#exactMatch".to_string(),
            ),
        })));
        assert!(!f.evaluate(&sample(), &table).unwrap());
    }
}

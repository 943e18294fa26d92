//! The Variable Manager (component L): named, per-mapping conditional
//! string bindings resolved lazily when a rule's action formats a template.

use crate::dsl::ast::Filter;
use crate::dsl::formatter::Formatter;
use crate::dsl::FunctionTable;
use crate::error::{Result, SssomError};
use crate::model::mapping::Mapping;
use indexmap::IndexMap;

/// One `(filter, template)` binding of a variable. `filter: None` is the
/// always-true binding.
struct Binding {
    filter: Option<Filter>,
    template: String,
}

/// Named string-valued bindings, each conditioned on a filter. Resolution
/// for a mapping scans a variable's bindings in declaration order and takes
/// the *last* one whose filter accepts the mapping.
#[derive(Default)]
pub struct VariableManager {
    bindings: IndexMap<String, Vec<Binding>>,
}

impl VariableManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding for `name`. Declaring the same name again adds another
    /// binding rather than replacing prior ones — all are considered at
    /// resolution time, last-match-wins.
    pub fn declare(&mut self, name: impl Into<String>, filter: Option<Filter>, template: impl Into<String>) {
        self.bindings
            .entry(name.into())
            .or_default()
            .push(Binding {
                filter,
                template: template.into(),
            });
    }

    /// Whether `name` has at least one binding — used at parse time to
    /// reject a reference to an undeclared variable.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Resolve `name` for `mapping`: the template of the last binding whose
    /// filter matches, expanded through `formatter`.
    ///
    /// # Errors
    /// Returns [`SssomError::DslRuntime`] if `name` has no binding, or if no
    /// binding's filter matches `mapping`.
    pub fn resolve(
        &self,
        name: &str,
        mapping: &Mapping,
        table: &FunctionTable,
        formatter: &Formatter,
    ) -> Result<String> {
        let bindings = self
            .bindings
            .get(name)
            .ok_or_else(|| SssomError::dsl_runtime(format!("unknown variable: {name}")))?;

        let mut chosen: Option<&str> = None;
        for binding in bindings {
            let accepts = match &binding.filter {
                Some(f) => f.evaluate(mapping, table)?,
                None => true,
            };
            if accepts {
                chosen = Some(&binding.template);
            }
        }
        let template = chosen
            .ok_or_else(|| SssomError::dsl_runtime(format!("no binding of variable '{name}' matched the mapping")))?;
        formatter.format(template, mapping)
    }

    /// Expand every `$name` reference in `template` by resolving it against
    /// `mapping`, then run the result through `formatter` for any remaining
    /// `%slot` placeholders.
    ///
    /// # Errors
    /// As [`Self::resolve`], or as [`Formatter::format`].
    pub fn expand(
        &self,
        template: &str,
        mapping: &Mapping,
        table: &FunctionTable,
        formatter: &Formatter,
    ) -> Result<String> {
        let mut substituted = String::new();
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                substituted.push(c);
                continue;
            }
            let mut name = String::new();
            while let Some(&c2) = chars.peek() {
                if c2.is_ascii_alphanumeric() || c2 == '_' {
                    name.push(c2);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                substituted.push('$');
                continue;
            }
            substituted.push_str(&self.resolve(&name, mapping, table, formatter)?);
        }
        formatter.format(&substituted, mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::ast::{CompareOp, FilterValue, SlotPredicate};
    use crate::model::mapping::MappingBuilder;
    use crate::prefix::manager::PrefixManager;

    fn sample(predicate: &str) -> Mapping {
        MappingBuilder::new()
            .subject_id("https://example.org/A")
            .predicate_id(predicate)
            .object_id("https://example.org/B")
            .mapping_justification("https://w3id.org/semapv/vocab/ManualMappingCuration")
            .build()
            .unwrap()
    }

    #[test]
    fn last_matching_binding_wins() {
        let mut vars = VariableManager::new();
        vars.declare("label", None, "default");
        vars.declare(
            "label",
            Some(Filter::Slot(SlotPredicate {
                slot: "predicate".to_string(),
                op: CompareOp::Eq,
                value: FilterValue::Pattern(
                    "http://www.w3.org/2004/02/skos/core#exactMatch".to_string(),
                ),
            })),
            "exact",
        );
        let table = FunctionTable::new();
        let prefixes = PrefixManager::new();
        let fmt = Formatter::new(&prefixes);

        let exact = sample("http://www.w3.org/2004/02/skos/core#exactMatch");
        assert_eq!(vars.resolve("label", &exact, &table, &fmt).unwrap(), "exact");

        let close = sample("http://www.w3.org/2004/02/skos/core#closeMatch");
        assert_eq!(vars.resolve("label", &close, &table, &fmt).unwrap(), "default");
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let vars = VariableManager::new();
        let table = FunctionTable::new();
        let prefixes = PrefixManager::new();
        let fmt = Formatter::new(&prefixes);
        assert!(vars.resolve("missing", &sample("x"), &table, &fmt).is_err());
    }

    #[test]
    fn expand_substitutes_dollar_references_then_formats() {
        let mut vars = VariableManager::new();
        vars.declare("greeting", None, "hello");
        let table = FunctionTable::new();
        let prefixes = PrefixManager::new();
        let fmt = Formatter::new(&prefixes);
        let out = vars
            .expand("$greeting, %subject_id", &sample("x"), &table, &fmt)
            .unwrap();
        assert_eq!(out, "hello, https://example.org/A");
    }
}

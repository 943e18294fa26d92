//! The Processing Pipeline (component K): applies an ordered rule
//! programme to a stream of mappings.
//!
//! Grounded on `linkml-service::rule_engine::types`'s `CompiledRule` /
//! execution-context shape: a programme is compiled once (rule selection by
//! tag, editor/prefix wiring) and then run mapping-by-mapping, mirroring how
//! the teacher separates "compile a rule set" from "apply it to an input".

use crate::dsl::ast::{Call, Item, Rule};
use crate::dsl::editor::MappingEditor;
use crate::dsl::FunctionTable;
use crate::error::Result;
use crate::model::mapping::Mapping;
use crate::model::mapping_set::MappingSet;
use crate::model::slot::NameFilter;
use crate::prefix::manager::PrefixManager;
use indexmap::IndexMap;
use tracing::debug;

/// Which of a programme's tagged rules actually run, chosen at load time
/// (`spec.md` §4.K, "rules may be filtered at programme-load time by
/// including or excluding tags").
pub type TagSelection = NameFilter;

/// What running a programme against a mapping set produced.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// The mappings marked for inclusion, in original order.
    pub mappings: Vec<Mapping>,
    /// Opaque products emitted by generator actions, in encounter order.
    pub products: Vec<serde_json::Value>,
}

/// Runs a fixed set of compiled rules against a [`MappingSet`].
pub struct Pipeline<'a> {
    rules: Vec<Rule>,
    table: &'a FunctionTable,
    editor: MappingEditor<'a>,
    invertible_predicates: &'a IndexMap<String, String>,
    include_all: bool,
}

impl<'a> Pipeline<'a> {
    /// Build a pipeline from every rule in `items` (headers are ignored —
    /// they are consumed by the parser, not the pipeline), keeping only the
    /// rules `tag_selection` admits.
    #[must_use]
    pub fn new(
        items: &[Item],
        tag_selection: &TagSelection,
        prefixes: &'a PrefixManager,
        table: &'a FunctionTable,
        invertible_predicates: &'a IndexMap<String, String>,
        include_all: bool,
    ) -> Self {
        let rules = items
            .iter()
            .filter_map(|item| match item {
                Item::Rule(rule) => Some(rule.clone()),
                Item::Header(_) => None,
            })
            .filter(|rule| rule_admitted(rule, tag_selection))
            .collect();
        Self {
            rules,
            table,
            editor: MappingEditor::new(prefixes),
            invertible_predicates,
            include_all,
        }
    }

    /// Run the compiled rules against every mapping in `set`, in original
    /// order, per `spec.md` §4.K's execution semantics. Never mutates
    /// `set`.
    ///
    /// # Errors
    /// Returns an error if a filter, editor primitive, or host action
    /// raises (a preprocessor returning "no mapping" is not an error — it
    /// silently drops that mapping, per `spec.md` §7).
    pub fn run(&self, set: &MappingSet) -> Result<PipelineOutput> {
        let mut output = PipelineOutput::default();
        for mapping in &set.mappings {
            self.run_one(mapping, &mut output)?;
        }
        Ok(output)
    }

    fn run_one(&self, input: &Mapping, output: &mut PipelineOutput) -> Result<()> {
        let mut current = input.clone();
        let mut marked = if self.include_all {
            Some(current.clone())
        } else {
            None
        };

        'rules: for rule in &self.rules {
            if !rule.filter.evaluate(&current, self.table)? {
                continue;
            }

            for action in &rule.actions {
                match action.name.as_str() {
                    "assign" => self.apply_assign(&mut current, action)?,
                    "edit" => self.apply_edit(&mut current, action)?,
                    "replace" => self.apply_replace(&mut current, action)?,
                    "invert" => match self.apply_invert(&current, action) {
                        Some(inverted) => current = inverted,
                        None => {
                            debug!(
                                subject_id = %current.subject_id,
                                predicate_id = %current.predicate_id,
                                "invert() produced no mapping, dropping it silently"
                            );
                            return Ok(());
                        }
                    },
                    "include" => marked = Some(current.clone()),
                    "stop" => {
                        if self.include_all {
                            marked = None;
                        }
                        break 'rules;
                    }
                    other => {
                        if let Some(product) =
                            self.table.call_action(other, &current, &action.args, &action.kwargs)?
                        {
                            output.products.push(product);
                        }
                    }
                }
            }
        }

        if let Some(m) = marked {
            output.mappings.push(m);
        }
        Ok(())
    }

    fn apply_assign(&self, mapping: &mut Mapping, call: &Call) -> Result<()> {
        self.editor
            .assign(mapping, call.args[0].as_str(), call.args[1].as_str())
    }

    fn apply_edit(&self, mapping: &mut Mapping, call: &Call) -> Result<()> {
        self.editor.edit(mapping, call.args[0].as_str())
    }

    fn apply_replace(&self, mapping: &mut Mapping, call: &Call) -> Result<()> {
        self.editor.replace(
            mapping,
            call.args[0].as_str(),
            call.args[1].as_str(),
            call.args[2].as_str(),
        )
    }

    fn apply_invert(&self, mapping: &Mapping, call: &Call) -> Option<Mapping> {
        let predicate_override = call.args.first().map(|a| a.as_str());
        mapping.invert(self.invertible_predicates, predicate_override)
    }
}

fn rule_admitted(rule: &Rule, selection: &TagSelection) -> bool {
    if rule.tags.is_empty() {
        return true;
    }
    rule.tags.iter().any(|tag| selection.admits(tag))
}

//! The SSSOM/T transformation DSL: lexer, parser, filter evaluator, mapping
//! editor, and template formatter (components H–L).

pub mod ast;
pub mod editor;
pub mod filter;
pub mod formatter;
pub mod lexer;
pub mod parser;

use crate::error::Result;
use crate::model::mapping::Mapping;
use ast::{ArgValue, KwArg};
use std::collections::HashMap;

/// A host-supplied application filter: `name(args) -> bool`.
pub type AppFilterFn = Box<dyn Fn(&Mapping, &[ArgValue], &[KwArg]) -> Result<bool> + Send + Sync>;

/// A host-supplied generator/callback action: `name(args)`. Returning
/// `Some(product)` emits a value to the pipeline's product stream; `None`
/// runs the call for its side effect only (a "callback" in `spec.md` §4.K).
pub type ActionFn =
    Box<dyn Fn(&Mapping, &[ArgValue], &[KwArg]) -> Result<Option<serde_json::Value>> + Send + Sync>;

struct Registered<F> {
    min_args: usize,
    max_args: Option<usize>,
    call: F,
}

/// The name registry the parser consults to accept or reject `ident(...)`
/// application filters and generator/callback actions (Design Notes §9,
/// "dynamic dispatch on actions/filters/generators" — a `FunctionTable`
/// replacing the source's reflective plugin lookup).
///
/// Built-in names (`assign`, `edit`, `replace`, `include`, `stop`, `invert`,
/// `is_missing`) are always recognised and never need registering here.
#[derive(Default)]
pub struct FunctionTable {
    app_filters: HashMap<String, Registered<AppFilterFn>>,
    actions: HashMap<String, Registered<ActionFn>>,
}

/// Names built into the parser/evaluator that a host never needs to (and
/// cannot) register in a [`FunctionTable`].
pub const BUILTIN_ACTION_NAMES: &[&str] =
    &["assign", "edit", "replace", "include", "stop", "invert"];

/// Built-in application-filter names, evaluated directly by [`filter`]
/// rather than dispatched through a [`FunctionTable`].
pub const BUILTIN_APP_FILTER_NAMES: &[&str] = &["is_missing"];

impl FunctionTable {
    /// An empty table recognising only the built-in names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host application filter under `name`.
    pub fn register_app_filter(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        call: AppFilterFn,
    ) {
        self.app_filters.insert(
            name.into(),
            Registered {
                min_args,
                max_args,
                call,
            },
        );
    }

    /// Register a host generator/callback action under `name`.
    pub fn register_action(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        call: ActionFn,
    ) {
        self.actions.insert(
            name.into(),
            Registered {
                min_args,
                max_args,
                call,
            },
        );
    }

    /// Whether `name` is a known application filter, built-in or registered.
    #[must_use]
    pub fn knows_app_filter(&self, name: &str) -> bool {
        BUILTIN_APP_FILTER_NAMES.contains(&name) || self.app_filters.contains_key(name)
    }

    /// Whether `name` is a known action, built-in or registered.
    #[must_use]
    pub fn knows_action(&self, name: &str) -> bool {
        BUILTIN_ACTION_NAMES.contains(&name) || self.actions.contains_key(name)
    }

    pub(crate) fn app_filter_arity(&self, name: &str) -> Option<(usize, Option<usize>)> {
        self.app_filters.get(name).map(|r| (r.min_args, r.max_args))
    }

    pub(crate) fn action_arity(&self, name: &str) -> Option<(usize, Option<usize>)> {
        self.actions.get(name).map(|r| (r.min_args, r.max_args))
    }

    pub(crate) fn call_app_filter(
        &self,
        name: &str,
        mapping: &Mapping,
        args: &[ArgValue],
        kwargs: &[KwArg],
    ) -> Result<bool> {
        match self.app_filters.get(name) {
            Some(r) => (r.call)(mapping, args, kwargs),
            None => Err(crate::error::SssomError::dsl_runtime(format!(
                "unregistered application filter: {name}"
            ))),
        }
    }

    pub(crate) fn call_action(
        &self,
        name: &str,
        mapping: &Mapping,
        args: &[ArgValue],
        kwargs: &[KwArg],
    ) -> Result<Option<serde_json::Value>> {
        match self.actions.get(name) {
            Some(r) => (r.call)(mapping, args, kwargs),
            None => Err(crate::error::SssomError::dsl_runtime(format!(
                "unregistered action: {name}"
            ))),
        }
    }
}

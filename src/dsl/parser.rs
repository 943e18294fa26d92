//! Recursive-descent parser over the lexer's token stream (component H).
//!
//! Modelled on `linkml-service::expression::parser`'s hand-written
//! recursive-descent shape (precedence climbing via nested `parse_*`
//! methods, no parser-generator), generalised to the SSSOM/T grammar.

use super::ast::{ArgValue, Call, CompareOp, Filter, FilterValue, Header, Item, KwArg, Rule, SlotPredicate};
use super::lexer::{tokenize, Token, TokenKind};
use super::FunctionTable;
use crate::error::{Result, SssomError};
use crate::prefix::manager::PrefixManager;
use std::collections::HashMap;

fn builtin_app_filter_arity(name: &str) -> Option<(usize, Option<usize>)> {
    match name {
        "is_missing" => Some((0, Some(0))),
        _ => None,
    }
}

fn builtin_action_arity(name: &str) -> Option<(usize, Option<usize>)> {
    match name {
        "assign" => Some((2, Some(2))),
        "edit" => Some((1, Some(1))),
        "replace" => Some((3, Some(3))),
        "include" | "stop" => Some((0, Some(0))),
        "invert" => Some((0, Some(1))),
        _ => None,
    }
}

fn starts_atom_token(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Word(_) | TokenKind::Bang | TokenKind::LParen)
}

/// Parses SSSOM/T source into [`Item`]s, accumulating errors across calls
/// per `spec.md` §4.H ("rules accumulate across multiple `parse` calls;
/// errors from one call do not discard prior rules").
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    prefixes: &'a PrefixManager,
    local_prefixes: HashMap<String, String>,
    table: &'a FunctionTable,
    items: Vec<Item>,
    errors: Vec<SssomError>,
}

impl<'a> Parser<'a> {
    /// A parser that expands CURIEs against `prefixes` (in addition to any
    /// `prefix(...)` headers seen in the source) and validates call names
    /// against `table`.
    #[must_use]
    pub fn new(prefixes: &'a PrefixManager, table: &'a FunctionTable) -> Self {
        Self {
            tokens: vec![Token {
                kind: TokenKind::Eof,
                line: 1,
                column: 1,
            }],
            pos: 0,
            prefixes,
            local_prefixes: HashMap::new(),
            table,
            items: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Parse one programme fragment, appending successfully parsed items to
    /// those from any earlier call.
    pub fn parse(&mut self, source: &str) -> Result<()> {
        match tokenize(source) {
            Ok(tokens) => self.tokens = tokens,
            Err(e) => {
                self.errors.push(e);
                return Ok(());
            }
        }
        self.pos = 0;
        self.skip_separators();
        while !self.at_eof() {
            match self.parse_item() {
                Ok(item) => self.items.push(item),
                Err(e) => {
                    self.errors.push(e);
                    self.recover();
                }
            }
            self.skip_separators();
        }
        Ok(())
    }

    /// Whether any call to [`Self::parse`] produced an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Every error accumulated across all calls to [`Self::parse`].
    #[must_use]
    pub fn errors(&self) -> &[SssomError] {
        &self.errors
    }

    /// Every item successfully parsed across all calls to [`Self::parse`].
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    fn parse_item(&mut self) -> Result<Item> {
        let tags = self.parse_optional_tags()?;
        if tags.is_empty() && self.looks_like_header() {
            return Ok(Item::Header(self.parse_header()?));
        }
        let filter = self.parse_filter()?;
        self.expect(&TokenKind::Arrow)?;
        let actions = self.parse_action_or_block()?;
        Ok(Item::Rule(Rule {
            tags,
            filter,
            actions,
        }))
    }

    fn parse_optional_tags(&mut self) -> Result<Vec<String>> {
        if !self.check(&TokenKind::LBracket) {
            return Ok(Vec::new());
        }
        self.advance();
        let mut tags = Vec::new();
        loop {
            let (name, _, _) = self.expect_word_loc()?;
            tags.push(name);
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(tags)
    }

    /// Peeks past a balanced `ident(...)` to see whether it stands alone as
    /// a header (nothing but a terminator after it) or continues into a
    /// filter (an operator, or another adjacent atom via implicit AND).
    fn looks_like_header(&self) -> bool {
        let mut i = self.pos;
        if !matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::Word(_))) {
            return false;
        }
        i += 1;
        if !matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::LParen)) {
            return false;
        }
        let mut depth = 0i32;
        loop {
            match self.tokens.get(i).map(|t| &t.kind) {
                Some(TokenKind::LParen) => {
                    depth += 1;
                    i += 1;
                }
                Some(TokenKind::RParen) => {
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        break;
                    }
                }
                Some(_) => i += 1,
                None => return false,
            }
        }
        match self.tokens.get(i).map(|t| &t.kind) {
            Some(TokenKind::Arrow | TokenKind::AndAnd | TokenKind::OrOr) => false,
            Some(k) if starts_atom_token(k) => false,
            _ => true,
        }
    }

    fn parse_header(&mut self) -> Result<Header> {
        let (name, line, column) = self.expect_word_loc()?;
        let call = self.parse_call_with_name(name)?;
        if call.name == "prefix" {
            self.apply_prefix_header(&call, line, column)?;
        } else if !self.table.knows_action(&call.name) {
            return Err(self.error_at(line, column, format!("unknown header: {}", call.name)));
        }
        Ok(Header { call })
    }

    fn apply_prefix_header(&mut self, call: &Call, line: usize, column: usize) -> Result<()> {
        let short = call
            .args
            .first()
            .ok_or_else(|| self.error_at(line, column, "prefix() requires a short name and an IRI"))?
            .as_str();
        let iri = call
            .args
            .get(1)
            .ok_or_else(|| self.error_at(line, column, "prefix() requires a short name and an IRI"))?
            .as_str();
        self.local_prefixes.insert(short.to_string(), iri.to_string());
        Ok(())
    }

    fn parse_filter(&mut self) -> Result<Filter> {
        let mut left = self.parse_conj()?;
        while self.check(&TokenKind::OrOr) {
            self.advance();
            let right = self.parse_conj()?;
            left = Filter::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_conj(&mut self) -> Result<Filter> {
        let mut left = self.parse_atom()?;
        loop {
            if self.check(&TokenKind::AndAnd) {
                self.advance();
                let right = self.parse_atom()?;
                left = Filter::And(Box::new(left), Box::new(right));
                continue;
            }
            if starts_atom_token(&self.peek().kind) {
                let right = self.parse_atom()?;
                left = Filter::And(Box::new(left), Box::new(right));
                continue;
            }
            break;
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<Filter> {
        if self.check(&TokenKind::Bang) {
            self.advance();
            let inner = self.parse_atom()?;
            return Ok(Filter::Not(Box::new(inner)));
        }
        if self.check(&TokenKind::LParen) {
            self.advance();
            let inner = self.parse_filter()?;
            self.expect(&TokenKind::RParen)?;
            return Ok(inner);
        }
        self.parse_predicate()
    }

    fn parse_predicate(&mut self) -> Result<Filter> {
        let (name, line, column) = self.expect_word_loc()?;
        if self.check(&TokenKind::LParen) {
            let call = self.parse_call_with_name(name.clone())?;
            let arity = builtin_app_filter_arity(&name).or_else(|| self.table.app_filter_arity(&name));
            let Some(arity) = arity else {
                return Err(self.error_at(line, column, format!("unknown application filter: {name}")));
            };
            self.check_arity(&call, arity, line, column)?;
            return Ok(Filter::Application(call));
        }
        let op = self.parse_compare_op()?;
        let value = self.parse_filter_value()?;
        Ok(Filter::Slot(SlotPredicate {
            slot: name,
            op,
            value,
        }))
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Eq => Ok(CompareOp::Eq),
            TokenKind::Ge => Ok(CompareOp::Ge),
            TokenKind::Le => Ok(CompareOp::Le),
            TokenKind::Gt => Ok(CompareOp::Gt),
            TokenKind::Lt => Ok(CompareOp::Lt),
            other => Err(SssomError::dsl_parse(
                format!("expected a comparison operator, found {other:?}"),
                tok.line,
                tok.column,
            )),
        }
    }

    fn parse_filter_value(&mut self) -> Result<FilterValue> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Word(w) if w == "*" => Ok(FilterValue::Wildcard),
            TokenKind::Word(w) if w == "~" => Ok(FilterValue::Absent),
            TokenKind::Word(w) => Ok(FilterValue::Pattern(self.expand(&w, tok.line, tok.column)?)),
            TokenKind::Str(s) if s.is_empty() => Ok(FilterValue::Empty),
            TokenKind::Str(s) => Ok(FilterValue::Pattern(s)),
            other => Err(SssomError::dsl_parse(
                format!("expected a value, found {other:?}"),
                tok.line,
                tok.column,
            )),
        }
    }

    fn parse_action_or_block(&mut self) -> Result<Vec<Call>> {
        if self.check(&TokenKind::LBrace) {
            self.advance();
            let mut actions = Vec::new();
            loop {
                self.skip_newlines();
                if self.check(&TokenKind::RBrace) {
                    self.advance();
                    break;
                }
                actions.push(self.parse_action()?);
                self.expect(&TokenKind::Semicolon)?;
            }
            Ok(actions)
        } else {
            Ok(vec![self.parse_action()?])
        }
    }

    fn parse_action(&mut self) -> Result<Call> {
        let (name, line, column) = self.expect_word_loc()?;
        let call = self.parse_call_with_name(name.clone())?;
        let arity = builtin_action_arity(&name).or_else(|| self.table.action_arity(&name));
        let Some(arity) = arity else {
            return Err(self.error_at(line, column, format!("unknown action: {name}")));
        };
        self.check_arity(&call, arity, line, column)?;
        Ok(call)
    }

    fn parse_call_with_name(&mut self, name: String) -> Result<Call> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                if self.check(&TokenKind::Slash) {
                    break;
                }
                args.push(self.parse_arg()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
            if self.check(&TokenKind::Slash) {
                self.advance();
                loop {
                    let (kw, _, _) = self.expect_word_loc()?;
                    self.expect(&TokenKind::Assign)?;
                    let value = self.parse_arg()?;
                    kwargs.push(KwArg { name: kw, value });
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Call { name, args, kwargs })
    }

    fn parse_arg(&mut self) -> Result<ArgValue> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Word(w) if w == "*" => Ok(ArgValue::Wildcard),
            TokenKind::Word(w) if w == "~" => Ok(ArgValue::Absent),
            TokenKind::Word(w) => Ok(ArgValue::Str(w)),
            TokenKind::Str(s) if s.is_empty() => Ok(ArgValue::Empty),
            TokenKind::Str(s) => Ok(ArgValue::Str(s)),
            other => Err(SssomError::dsl_parse(
                format!("expected an argument, found {other:?}"),
                tok.line,
                tok.column,
            )),
        }
    }

    fn check_arity(
        &self,
        call: &Call,
        arity: (usize, Option<usize>),
        line: usize,
        column: usize,
    ) -> Result<()> {
        let n = call.args.len();
        let (min, max) = arity;
        if n < min || max.is_some_and(|max| n > max) {
            return Err(self.error_at(
                line,
                column,
                format!("{}() takes the wrong number of arguments ({n} given)", call.name),
            ));
        }
        Ok(())
    }

    fn expand(&self, word: &str, line: usize, column: usize) -> Result<String> {
        if word.contains("://") {
            return Ok(word.to_string());
        }
        if let Some((short, local)) = word.split_once(':') {
            if let Some(prefix) = self.local_prefixes.get(short) {
                return Ok(format!("{prefix}{local}"));
            }
        }
        self.prefixes.expand(word).map_err(|e| match e {
            SssomError::Prefix { message, .. } => SssomError::dsl_parse(message, line, column),
            other => other,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(SssomError::dsl_parse(
                format!("expected {kind:?}, found {:?}", tok.kind),
                tok.line,
                tok.column,
            ))
        }
    }

    fn expect_word_loc(&mut self) -> Result<(String, usize, usize)> {
        let tok = self.peek().clone();
        if let TokenKind::Word(w) = tok.kind {
            self.advance();
            Ok((w, tok.line, tok.column))
        } else {
            Err(SssomError::dsl_parse(
                format!("expected an identifier, found {:?}", tok.kind),
                tok.line,
                tok.column,
            ))
        }
    }

    fn error_at(&self, line: usize, column: usize, message: impl Into<String>) -> SssomError {
        SssomError::dsl_parse(message.into(), line, column)
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while self.check(&TokenKind::Semicolon) || self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Resynchronise after an error by skipping to the next item boundary.
    fn recover(&mut self) {
        while !matches!(
            self.peek().kind,
            TokenKind::Semicolon | TokenKind::Newline | TokenKind::Eof
        ) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_rename_by_assignment_scenario() {
        let prefixes = PrefixManager::new();
        let table = FunctionTable::new();
        let mut parser = Parser::new(&prefixes, &table);
        parser
            .parse("subject==* -> assign('predicate_id', 'skos:exactMatch');")
            .unwrap();
        assert!(!parser.has_errors(), "{:?}", parser.errors());
        assert_eq!(parser.items().len(), 1);
        match &parser.items()[0] {
            Item::Rule(rule) => {
                assert_eq!(rule.actions.len(), 1);
                assert_eq!(rule.actions[0].name, "assign");
            }
            other => panic!("expected a rule, got {other:?}"),
        }
    }

    #[test]
    fn parses_the_include_stop_scenario_with_two_rules() {
        let prefixes = PrefixManager::new();
        let table = FunctionTable::new();
        let mut parser = Parser::new(&prefixes, &table);
        parser
            .parse("!predicate==skos:exactMatch -> stop();\nsubject==ORG:* -> include();")
            .unwrap();
        assert!(!parser.has_errors(), "{:?}", parser.errors());
        assert_eq!(parser.items().len(), 2);
    }

    #[test]
    fn a_prefix_header_is_visible_to_later_rules() {
        let prefixes = PrefixManager::new();
        let table = FunctionTable::new();
        let mut parser = Parser::new(&prefixes, &table);
        parser
            .parse("prefix('ORG', 'https://example.org/ORG_');\nsubject==ORG:0001 -> include();")
            .unwrap();
        assert!(!parser.has_errors(), "{:?}", parser.errors());
        assert_eq!(parser.items().len(), 2);
        match &parser.items()[1] {
            Item::Rule(rule) => match &rule.filter {
                Filter::Slot(pred) => assert_eq!(
                    pred.value,
                    FilterValue::Pattern("https://example.org/ORG_0001".to_string())
                ),
                other => panic!("expected a slot predicate, got {other:?}"),
            },
            other => panic!("expected a rule, got {other:?}"),
        }
    }

    #[test]
    fn unknown_application_filter_is_a_parse_error() {
        let prefixes = PrefixManager::new();
        let table = FunctionTable::new();
        let mut parser = Parser::new(&prefixes, &table);
        parser.parse("nonsense_filter() -> stop();").unwrap();
        assert!(parser.has_errors());
    }

    #[test]
    fn errors_in_one_call_do_not_discard_earlier_rules() {
        let prefixes = PrefixManager::new();
        let table = FunctionTable::new();
        let mut parser = Parser::new(&prefixes, &table);
        parser.parse("subject==* -> include();").unwrap();
        assert_eq!(parser.items().len(), 1);
        parser.parse("subject==* -> nonsense_action();").unwrap();
        assert_eq!(parser.items().len(), 1);
        assert!(parser.has_errors());
    }

    #[test]
    fn tags_and_negation_parse() {
        let prefixes = PrefixManager::new();
        let table = FunctionTable::new();
        let mut parser = Parser::new(&prefixes, &table);
        parser
            .parse("[curation] !predicate==skos:exactMatch -> stop();")
            .unwrap();
        assert!(!parser.has_errors(), "{:?}", parser.errors());
        match &parser.items()[0] {
            Item::Rule(rule) => {
                assert_eq!(rule.tags, vec!["curation".to_string()]);
                assert!(matches!(rule.filter, Filter::Not(_)));
            }
            other => panic!("expected a rule, got {other:?}"),
        }
    }

    #[test]
    fn block_action_body_requires_semicolons() {
        let prefixes = PrefixManager::new();
        let table = FunctionTable::new();
        let mut parser = Parser::new(&prefixes, &table);
        parser
            .parse("subject==* -> { assign('comment', 'seen'); include(); }")
            .unwrap();
        assert!(!parser.has_errors(), "{:?}", parser.errors());
        match &parser.items()[0] {
            Item::Rule(rule) => assert_eq!(rule.actions.len(), 2),
            other => panic!("expected a rule, got {other:?}"),
        }
    }
}

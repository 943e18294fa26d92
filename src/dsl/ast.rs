//! Abstract syntax tree produced by the parser (component H).

/// A comparison operator in a slot predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

/// A value literal on the right-hand side of a slot predicate, already
/// resolved at parse time (CURIE expansion happens before this is built).
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A literal or glob pattern (`*` stands for "zero or more characters").
    /// Produced by a quoted string, or a CURIE/bare token expanded to its
    /// full IRI with any embedded `*` preserved.
    Pattern(String),
    /// The bare `*` token: matches any present, non-empty value.
    Wildcard,
    /// The empty-string literal `""`: matches a null or empty value.
    Empty,
    /// The `~` token: matches a null (absent) value, not merely an empty one.
    Absent,
}

/// One `slot op value` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPredicate {
    pub slot: String,
    pub op: CompareOp,
    pub value: FilterValue,
}

/// A literal or pass-through argument to an action or application filter.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Wildcard,
    Empty,
    Absent,
}

impl ArgValue {
    /// The argument's string form, for editor/formatter operations that
    /// only ever see plain literals (assign/replace arguments never carry
    /// the filter-only wildcard/absent markers in valid program text, but
    /// we render them rather than panic if they do).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Str(s) => s,
            Self::Wildcard => "*",
            Self::Empty => "",
            Self::Absent => "~",
        }
    }
}

/// A named keyword argument, `kw=value`.
#[derive(Debug, Clone, PartialEq)]
pub struct KwArg {
    pub name: String,
    pub value: ArgValue,
}

/// A call to a named action or application filter: `name(args /kw=val,...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<ArgValue>,
    pub kwargs: Vec<KwArg>,
}

/// A boolean combination of predicates and application filters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Or(Box<Filter>, Box<Filter>),
    And(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    Slot(SlotPredicate),
    Application(Call),
}

/// One `[tags] filter -> action(s);` rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub tags: Vec<String>,
    pub filter: Filter,
    pub actions: Vec<Call>,
}

/// A bare `ident(arglist?)` programme-level header, e.g. `prefix(...)` or a
/// variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub call: Call,
}

/// One top-level item of a parsed programme.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Header(Header),
    Rule(Rule),
}

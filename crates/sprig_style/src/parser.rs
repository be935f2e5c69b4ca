//! Stylesheet parser
//!
//! Parses a practical subset of CSS into a [`Stylesheet`] that can be
//! adopted by a component's render root. The parser keeps selectors and
//! values as text; it does not interpret them.
//!
//! # Supported Syntax
//!
//! - Qualified rules with selector lists: `.card, #main > p { ... }`
//! - Declarations, including `!important` and custom properties (`--accent`)
//! - Block comments: `/* ... */`
//! - Block at-rules with nested rules: `@media`, `@supports`, `@keyframes`, ...
//! - Block at-rules with declarations: `@font-face`, `@page`, `@property`
//! - Statement at-rules: `@import url(base.css);`, `@charset "utf-8";`
//!
//! # Error Handling
//!
//! Unlike a browser, the parser does not recover from malformed input: the
//! first syntax error fails the whole sheet with a positioned [`ParseError`].
//!
//! # Example
//!
//! ```rust
//! use sprig_style::Stylesheet;
//!
//! let sheet = Stylesheet::parse(":host { --accent: #0a84ff; } .btn { color: var(--accent); }").unwrap();
//! assert_eq!(sheet.variable("accent"), Some("#0a84ff"));
//! assert_eq!(sheet.rules_for(".btn").count(), 1);
//! ```

use std::borrow::Cow;
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, multispace1},
    combinator::{cut, map, value},
    error::{context, ErrorKind, ParseError as NomParseError, VerboseError, VerboseErrorKind},
    multi::many0,
    sequence::delimited,
    Finish, IResult,
};
use tracing::debug;

/// Parser result type using VerboseError for diagnostics
type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// At-rules whose block holds declarations rather than nested rules
const DECLARATION_AT_RULES: &[&str] = &["font-face", "page", "property", "counter-style", "viewport"];

/// Selectors whose custom properties are exposed as sheet variables
const VARIABLE_SCOPES: &[&str] = &[":root", ":host"];

// ============================================================================
// Errors
// ============================================================================

/// Error type for stylesheet parsing with position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// The input fragment where parsing failed
    pub fragment: String,
    /// Context stack from nom's VerboseError, innermost first
    pub contexts: Vec<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: {}",
            self.line, self.column, self.message
        )?;
        if !self.fragment.is_empty() {
            write!(f, " (near \"{}\")", self.fragment)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    /// Create a ParseError from a nom VerboseError
    fn from_verbose(input: &str, err: VerboseError<&str>) -> Self {
        let (line, column, fragment) = match err.errors.first() {
            Some((frag, _)) => calculate_position(input, frag),
            None => (1, 1, String::new()),
        };

        let contexts: Vec<String> = err
            .errors
            .iter()
            .filter_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(ctx) => Some((*ctx).to_string()),
                _ => None,
            })
            .collect();

        Self {
            message: format_verbose_error(&err),
            line,
            column,
            fragment,
            contexts,
        }
    }
}

/// Format a VerboseError into a human-readable message
fn format_verbose_error(err: &VerboseError<&str>) -> String {
    let mut parts = Vec::new();

    for (input, kind) in &err.errors {
        match kind {
            VerboseErrorKind::Context(ctx) => parts.push(format!("in {}", ctx)),
            VerboseErrorKind::Char(c) => {
                let preview: String = input.chars().take(20).collect();
                parts.push(format!("expected '{}' near \"{}\"", c, preview));
            }
            VerboseErrorKind::Nom(ek) => parts.push(format!("{:?}", ek)),
        }
    }

    if parts.is_empty() {
        "unknown parse error".to_string()
    } else {
        parts.join(", ")
    }
}

/// Calculate line and column from the original input and the error fragment
fn calculate_position(original: &str, fragment: &str) -> (usize, usize, String) {
    let offset = original.len().saturating_sub(fragment.len());
    let consumed = &original[..offset];

    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rfind('\n')
        .map(|pos| offset - pos)
        .unwrap_or(offset + 1);

    let preview: String = fragment.chars().take(30).collect();
    (line, column, preview)
}

// ============================================================================
// Stylesheet model
// ============================================================================

/// A single `property: value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// A qualified rule: selector list plus declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Value of the last declaration for `property`
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    /// Whether the selector list contains `selector` verbatim
    pub fn matches(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s == selector)
    }
}

/// Body of an at-rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtRuleBody {
    /// `@import ...;`
    Statement,
    /// `@media ... { rules }`
    Rules(Vec<CssRule>),
    /// `@font-face { declarations }`
    Declarations(Vec<Declaration>),
}

/// An at-rule such as `@media` or `@import`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    pub name: String,
    pub prelude: String,
    pub body: AtRuleBody,
}

/// A top-level or nested rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssRule {
    Style(StyleRule),
    At(AtRule),
}

/// A parsed stylesheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    rules: Vec<CssRule>,
}

impl Stylesheet {
    /// Create an empty stylesheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse stylesheet text
    ///
    /// Fails on the first syntax error; parse errors are also logged via
    /// tracing at DEBUG level.
    pub fn parse(css: &str) -> Result<Self, ParseError> {
        match rule_list(css, false).finish() {
            Ok((_, rules)) => Ok(Self { rules }),
            Err(e) => {
                let err = ParseError::from_verbose(css, e);
                debug!(
                    line = err.line,
                    column = err.column,
                    message = %err.message,
                    "stylesheet parse error"
                );
                Err(err)
            }
        }
    }

    /// All top-level rules in source order
    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    /// Number of top-level rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the sheet has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Top-level qualified rules
    pub fn style_rules(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter().filter_map(|rule| match rule {
            CssRule::Style(style) => Some(style),
            CssRule::At(_) => None,
        })
    }

    /// Top-level at-rules with the given name (without `@`)
    pub fn at_rules<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AtRule> + 'a {
        self.rules.iter().filter_map(move |rule| match rule {
            CssRule::At(at) if at.name.eq_ignore_ascii_case(name) => Some(at),
            _ => None,
        })
    }

    /// Top-level rules whose selector list contains `selector`
    pub fn rules_for<'a>(&'a self, selector: &'a str) -> impl Iterator<Item = &'a StyleRule> + 'a {
        self.style_rules().filter(move |rule| rule.matches(selector))
    }

    /// Look up a custom property declared on `:root` or `:host`
    ///
    /// `name` is given without the leading `--`. Later declarations win.
    pub fn variable(&self, name: &str) -> Option<&str> {
        let property = format!("--{}", name);
        self.style_rules()
            .filter(|rule| VARIABLE_SCOPES.iter().any(|scope| rule.matches(scope)))
            .filter_map(|rule| rule.get(&property))
            .last()
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_rules(f, &self.rules, 0)
    }
}

fn write_declarations(f: &mut fmt::Formatter<'_>, decls: &[Declaration], indent: usize) -> fmt::Result {
    for decl in decls {
        write!(f, "{:width$}{}: {}", "", decl.property, decl.value, width = indent)?;
        if decl.important {
            write!(f, " !important")?;
        }
        writeln!(f, ";")?;
    }
    Ok(())
}

fn write_rules(f: &mut fmt::Formatter<'_>, rules: &[CssRule], indent: usize) -> fmt::Result {
    for rule in rules {
        match rule {
            CssRule::Style(style) => {
                writeln!(f, "{:width$}{} {{", "", style.selectors.join(", "), width = indent)?;
                write_declarations(f, &style.declarations, indent + 2)?;
                writeln!(f, "{:width$}}}", "", width = indent)?;
            }
            CssRule::At(at) => {
                write!(f, "{:width$}@{}", "", at.name, width = indent)?;
                if !at.prelude.is_empty() {
                    write!(f, " {}", at.prelude)?;
                }
                match &at.body {
                    AtRuleBody::Statement => writeln!(f, ";")?,
                    AtRuleBody::Rules(nested) => {
                        writeln!(f, " {{")?;
                        write_rules(f, nested, indent + 2)?;
                        writeln!(f, "{:width$}}}", "", width = indent)?;
                    }
                    AtRuleBody::Declarations(decls) => {
                        writeln!(f, " {{")?;
                        write_declarations(f, decls, indent + 2)?;
                        writeln!(f, "{:width$}}}", "", width = indent)?;
                    }
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Nom parsers
// ============================================================================

/// Build a non-recoverable error carrying a context label
fn failure<'a, O>(input: &'a str, ctx: &'static str) -> ParseResult<'a, O> {
    Err(nom::Err::Failure(VerboseError {
        errors: vec![(input, VerboseErrorKind::Context(ctx))],
    }))
}

/// Parse whitespace and comments
fn ws(input: &str) -> ParseResult<'_, ()> {
    value(
        (),
        many0(alt((value((), multispace1), value((), parse_comment)))),
    )(input)
}

/// Parse a block comment /* ... */
fn parse_comment(input: &str) -> ParseResult<'_, &str> {
    delimited(tag("/*"), take_until("*/"), tag("*/"))(input)
}

/// Parse an identifier (alphanumeric, hyphen, underscore)
fn identifier(input: &str) -> ParseResult<'_, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

/// Byte offset of the first unquoted, unnested occurrence of any `stops`
///
/// Comments are skipped like quoted text.
fn scan_until(input: &str, stops: &[char]) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut skip_to = 0;

    for (i, c) in input.char_indices() {
        if i < skip_to {
            continue;
        }
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '/' if input[i..].starts_with("/*") => skip_to = comment_end(input, i),
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 && stops.contains(&c) => return i,
            _ => {}
        }
    }
    input.len()
}

/// Byte offset just past the comment opening at `start`
///
/// An unterminated comment runs to the end of input.
fn comment_end(input: &str, start: usize) -> usize {
    input[start + 2..]
        .find("*/")
        .map_or(input.len(), |end| start + 2 + end + 2)
}

/// Remove comments outside quotes from trimmed prelude or value text
fn strip_comments(text: &str) -> Cow<'_, str> {
    if !text.contains("/*") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut skip_to = 0;
    let mut squeeze = false;

    for (i, c) in text.char_indices() {
        if i < skip_to {
            continue;
        }
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            out.push(c);
            continue;
        }
        match c {
            '/' if text[i..].starts_with("/*") => {
                skip_to = comment_end(text, i);
                squeeze = out.is_empty() || out.ends_with(char::is_whitespace);
            }
            c if c.is_whitespace() && squeeze => {}
            _ => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                squeeze = false;
                out.push(c);
            }
        }
    }
    Cow::Owned(out.trim().to_string())
}

/// Split on `sep` outside quotes and parentheses
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = input;
    loop {
        let end = scan_until(rest, &[sep]);
        parts.push(rest[..end].trim());
        if end >= rest.len() {
            break;
        }
        rest = &rest[end + sep.len_utf8()..];
    }
    parts
}

/// Parse a rule prelude: everything up to `{`, `;` or `}`, without comments
fn prelude(input: &str) -> ParseResult<'_, Cow<'_, str>> {
    let end = scan_until(input, &['{', ';', '}']);
    let text = strip_comments(input[..end].trim());
    if text.is_empty() {
        return Err(nom::Err::Error(VerboseError::from_error_kind(
            input,
            ErrorKind::TakeWhile1,
        )));
    }
    Ok((&input[end..], text))
}

/// Parse a declaration value (everything until an unnested `;` or `}`)
///
/// Comments are dropped and a trailing `!important` is split off.
fn declaration_value(input: &str) -> ParseResult<'_, (String, bool)> {
    let end = scan_until(input, &[';', '}']);
    let raw = strip_comments(input[..end].trim());
    if raw.is_empty() {
        return Err(nom::Err::Error(VerboseError::from_error_kind(
            input,
            ErrorKind::TakeWhile1,
        )));
    }

    let parsed = match raw.rfind('!') {
        Some(pos) if raw[pos + 1..].trim().eq_ignore_ascii_case("important") => {
            (raw[..pos].trim_end().to_string(), true)
        }
        _ => (raw.into_owned(), false),
    };
    Ok((&input[end..], parsed))
}

/// Parse a single declaration: name: value
fn declaration(input: &str) -> ParseResult<'_, Declaration> {
    let (input, property) = context("property name", identifier)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = context("colon after property name", cut(char(':')))(input)?;
    let (input, _) = ws(input)?;
    let (input, (value, important)) = context("property value", cut(declaration_value))(input)?;

    Ok((
        input,
        Declaration {
            property: property.to_string(),
            value,
            important,
        },
    ))
}

/// Parse a declaration block: { name: value; ... }
fn declaration_block(input: &str) -> ParseResult<'_, Vec<Declaration>> {
    let (input, _) = context("opening brace", char('{'))(input)?;
    let (input, _) = ws(input)?;
    let (input, items) = many0(|i| {
        let (i, item) = alt((map(declaration, Some), value(None, char(';'))))(i)?;
        let (i, _) = ws(i)?;
        Ok((i, item))
    })(input)?;
    let (input, _) = context("closing brace", cut(char('}')))(input)?;

    Ok((input, items.into_iter().flatten().collect()))
}

/// Parse a qualified rule: selectors { declarations }
fn style_rule(input: &str) -> ParseResult<'_, StyleRule> {
    let (rest, selector_text) = context("selector", prelude)(input)?;

    let selectors: Vec<String> = split_top_level(&selector_text, ',')
        .into_iter()
        .map(str::to_string)
        .collect();
    if selectors.iter().any(String::is_empty) {
        return failure(input, "selector list");
    }

    let (rest, declarations) = context("rule block", cut(declaration_block))(rest)?;
    Ok((
        rest,
        StyleRule {
            selectors,
            declarations,
        },
    ))
}

/// Parse an at-rule: @name prelude; or @name prelude { ... }
fn at_rule(input: &str) -> ParseResult<'_, AtRule> {
    let (input, _) = char('@')(input)?;
    let (input, name) = context("at-rule name", cut(identifier))(input)?;

    let end = scan_until(input, &['{', ';', '}']);
    let at_prelude = strip_comments(input[..end].trim()).into_owned();
    let rest = &input[end..];
    let name = name.to_string();

    match rest.chars().next() {
        None => Ok((
            rest,
            AtRule {
                name,
                prelude: at_prelude,
                body: AtRuleBody::Statement,
            },
        )),
        Some(';') => Ok((
            &rest[1..],
            AtRule {
                name,
                prelude: at_prelude,
                body: AtRuleBody::Statement,
            },
        )),
        Some('{') if DECLARATION_AT_RULES.contains(&name.to_ascii_lowercase().as_str()) => {
            let (rest, decls) = context("at-rule block", cut(declaration_block))(rest)?;
            Ok((
                rest,
                AtRule {
                    name,
                    prelude: at_prelude,
                    body: AtRuleBody::Declarations(decls),
                },
            ))
        }
        Some('{') => {
            let (rest, nested) = nested_rules(&rest[1..])?;
            Ok((
                rest,
                AtRule {
                    name,
                    prelude: at_prelude,
                    body: AtRuleBody::Rules(nested),
                },
            ))
        }
        Some(_) => failure(rest, "at-rule terminator"),
    }
}

/// Parse rules inside an at-rule block, consuming the closing brace
fn nested_rules(input: &str) -> ParseResult<'_, Vec<CssRule>> {
    let (input, rules) = rule_list(input, true)?;
    let (input, _) = context("closing brace", cut(char('}')))(input)?;
    Ok((input, rules))
}

/// Parse one rule of either kind
fn css_rule(input: &str) -> ParseResult<'_, CssRule> {
    alt((map(at_rule, CssRule::At), map(style_rule, CssRule::Style)))(input)
}

/// Parse a sequence of rules
///
/// Top-level lists run to end of input; nested lists stop before `}`.
fn rule_list(mut input: &str, nested: bool) -> ParseResult<'_, Vec<CssRule>> {
    let mut rules = Vec::new();
    loop {
        let (rest, _) = ws(input)?;
        input = rest;

        if input.is_empty() {
            if nested {
                return failure(input, "closing brace");
            }
            return Ok((input, rules));
        }
        if input.starts_with('}') {
            if nested {
                return Ok((input, rules));
            }
            return failure(input, "unexpected closing brace");
        }

        match css_rule(input) {
            Ok((rest, rule)) => {
                rules.push(rule);
                input = rest;
            }
            Err(nom::Err::Error(e)) => return Err(nom::Err::Failure(e)),
            Err(e) => return Err(e),
        }
    }
}

//! Filter template mini-language
//!
//! A filter template is a SQL fragment with `$` markers:
//!
//! * `$-Name` is replaced with the quoted table name registered for the type
//!   or table `Name`. It consumes no argument.
//! * `$N` (digits) re-uses the parameter already bound for the zero-based
//!   argument `N` of the same call.
//! * `$` binds the next unconsumed argument as a new parameter.
//!
//! Templates are tokenized first and rendered in a second pass, so parsing
//! never depends on the argument values.

use tracing::debug;

use crate::dialect::SqlDialect;
use crate::error::{ModelError, ModelResult};
use crate::schema::SchemaRegistry;
use crate::types::Value;

/// One lexical element of a filter template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterToken {
    /// Raw SQL copied verbatim
    Literal(String),
    /// `$`
    NextArgument,
    /// `$N`
    BackReference(usize),
    /// `$-Name`
    TableToken(String),
}

/// Split a template into tokens
pub fn parse_filter(template: &str) -> ModelResult<Vec<FilterToken>> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            literal.push(c);
            continue;
        }

        if !literal.is_empty() {
            tokens.push(FilterToken::Literal(std::mem::take(&mut literal)));
        }

        let rest = chars.peek().map(|&(i, _)| &template[i..]).unwrap_or("");

        if let Some(name) = table_token(rest) {
            // '-' plus the identifier
            for _ in 0..name.chars().count() + 1 {
                chars.next();
            }
            tokens.push(FilterToken::TableToken(name.to_string()));
        } else if rest.starts_with(|c: char| c.is_ascii_digit()) {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            for _ in 0..digits.len() {
                chars.next();
            }
            let index = digits.parse::<usize>().map_err(|_| {
                ModelError::Query(format!("back-reference ${} is out of range", digits))
            })?;
            tokens.push(FilterToken::BackReference(index));
        } else {
            tokens.push(FilterToken::NextArgument);
        }
    }

    if !literal.is_empty() {
        tokens.push(FilterToken::Literal(literal));
    }

    Ok(tokens)
}

/// Identifier after `-`: a letter followed by letters, digits or underscores
fn table_token(rest: &str) -> Option<&str> {
    let name = rest.strip_prefix('-')?;
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = name
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    Some(&name[..end])
}

/// Renders parsed templates against a registry and dialect
pub struct FilterRenderer<'a> {
    registry: &'a SchemaRegistry,
    dialect: SqlDialect,
}

impl<'a> FilterRenderer<'a> {
    pub fn new(registry: &'a SchemaRegistry, dialect: SqlDialect) -> Self {
        Self { registry, dialect }
    }

    /// Render `template`, appending newly bound arguments to `params`.
    /// Parameter names continue from `params.len()`. On error `params` is
    /// left untouched.
    pub fn render(&self, template: &str, args: Vec<Value>, params: &mut Vec<Value>) -> ModelResult<String> {
        let tokens = parse_filter(template)?;
        let base = params.len();
        let supplied = args.len();

        let mut args = args.into_iter();
        let mut bound: Vec<Value> = Vec::new();
        let mut sql = String::with_capacity(template.len() + 8);

        for token in &tokens {
            match token {
                FilterToken::Literal(text) => sql.push_str(text),
                FilterToken::TableToken(name) => {
                    let metadata = self.registry.resolve_table_token(name)?;
                    sql.push_str(&self.dialect.quote_identifier(&metadata.name));
                }
                FilterToken::NextArgument => {
                    let value = args.next().ok_or_else(|| {
                        ModelError::Query(format!(
                            "filter '{}' needs more than the {} supplied argument(s)",
                            template, supplied
                        ))
                    })?;
                    sql.push_str(&self.dialect.parameter_placeholder(base + bound.len()));
                    bound.push(value);
                }
                FilterToken::BackReference(index) => {
                    if *index >= bound.len() {
                        return Err(ModelError::Query(format!(
                            "filter '{}' references ${} before that argument was bound",
                            template, index
                        )));
                    }
                    sql.push_str(&self.dialect.parameter_placeholder(base + index));
                }
            }
        }

        let surplus = args.len();
        if surplus > 0 {
            debug!(template, surplus, "Ignoring unused filter arguments");
        }

        params.extend(bound);
        Ok(sql)
    }

    /// Render a fragment that may only contain table tokens, such as a join
    /// condition
    pub fn render_static(&self, template: &str) -> ModelResult<String> {
        let mut params = Vec::new();
        let sql = self.render(template, Vec::new(), &mut params)?;
        Ok(sql)
    }
}

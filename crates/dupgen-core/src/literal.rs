//! Rendering of field values as import-script literals
//!
//! The import interpreter reads Python 2 style literals: `u'...'` strings,
//! `None`, `True`/`False`, `[...]` lists and `{'key': value}` mappings.
//! Values that denote another record of the export render as that record's
//! bare handle so the script can wire references between records.
//!
//! Id substitution inside free text is purely textual: any substring equal
//! to a mapped source id is rewritten, including coincidental matches in
//! prose.

use regex::{Regex, RegexBuilder};

use crate::binder::{Bindings, RecordHandle};
use crate::remap::IdentifierMap;
use crate::value::Value;

/// Upper bound for the compiled id alternation
const SUBSTITUTION_SIZE_LIMIT: usize = 64 << 20;

/// Escape a string for use inside a quoted literal.
///
/// Only backslash, both quote characters, newline and carriage return are
/// escaped; everything else is emitted as is.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Replace ids in one left-to-right pass. At each position the first
/// matching entry of `sources` wins, so they must be sorted longest first.
fn scan_replace<'s, F>(text: &str, sources: &[&'s str], target_of: F) -> String
where
    F: Fn(&'s str) -> &'s str,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        match sources.iter().find(|source| rest.starts_with(**source)) {
            Some(source) => {
                out.push_str(target_of(*source));
                rest = &rest[source.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// A unicode string literal: `u'<escaped>'`
pub fn quoted(value: &str) -> String {
    format!("u'{}'", escape(value))
}

/// Lookup state shared by every value rendered into one document
pub struct RenderContext<'m, 'b> {
    ids: &'m IdentifierMap,
    bindings: &'m Bindings<'b>,
    substitution: Substitution<'m>,
}

enum Substitution<'m> {
    /// Every mapped id is its own target
    None,
    /// Single pass over the text, longest id first at each position
    Pattern(Regex),
    /// The same scan without a compiled pattern, for alternations too large
    /// to compile; ids sorted longest first
    Scan(Vec<&'m str>),
}

impl<'m, 'b> RenderContext<'m, 'b> {
    pub fn new(ids: &'m IdentifierMap, bindings: &'m Bindings<'b>) -> Self {
        let substitution = if ids.changed().next().is_none() {
            Substitution::None
        } else {
            let mut sources: Vec<&str> = ids.iter().map(|(s, _)| s).filter(|s| !s.is_empty()).collect();
            sources.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let alternation = sources
                .iter()
                .map(|s| regex::escape(s))
                .collect::<Vec<_>>()
                .join("|");

            match RegexBuilder::new(&alternation)
                .size_limit(SUBSTITUTION_SIZE_LIMIT)
                .build()
            {
                Ok(re) => Substitution::Pattern(re),
                Err(e) => {
                    tracing::warn!(error = %e, ids = sources.len(), "id pattern too large, scanning instead");
                    Substitution::Scan(sources)
                }
            }
        };

        Self {
            ids,
            bindings,
            substitution,
        }
    }

    /// Handle of the record a source id denotes
    pub fn handle(&self, id: &str) -> Option<RecordHandle> {
        self.bindings.handle(id)
    }

    /// Target id of a source id
    pub fn target_id<'s>(&'s self, id: &'s str) -> &'s str {
        self.ids.target_of(id)
    }

    /// Replace every mapped source id occurring in `text` with its target id
    pub fn substitute_ids(&self, text: &str) -> String {
        match &self.substitution {
            Substitution::None => text.to_string(),
            Substitution::Pattern(re) => re
                .replace_all(text, |caps: &regex::Captures| {
                    let found = caps.get(0).map(|m| m.as_str()).unwrap_or("");
                    self.ids.target_of(found).to_string()
                })
                .into_owned(),
            Substitution::Scan(sources) => scan_replace(text, sources, |id| self.ids.target_of(id)),
        }
    }

    /// Handle a value resolves to when it denotes a bound record: a string
    /// equal to a bound id, or a reference object whose id is bound
    fn resolve_reference(&self, value: &Value) -> Option<RecordHandle> {
        match value {
            Value::Str(s) => self.handle(s),
            Value::Map(_) => value.reference_id().and_then(|id| self.handle(id)),
            _ => None,
        }
    }

    /// Render a value as literal text
    pub fn render(&self, value: &Value) -> String {
        match value {
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Number(n) => n.to_string(),
            Value::Str(s) => match self.handle(s) {
                Some(handle) => handle.to_string(),
                None => quoted(&self.substitute_ids(s)),
            },
            Value::List(items) => {
                if let [single] = items.as_slice() {
                    if let Some(handle) = self.resolve_reference(single) {
                        return handle.to_string();
                    }
                }
                let rendered: Vec<String> = items.iter().map(|item| self.render(item)).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Map(entries) => {
                if let Some(id) = value.reference_id() {
                    return match self.handle(id) {
                        Some(handle) => handle.to_string(),
                        None => quoted(self.ids.target_of(id)),
                    };
                }
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("'{}': {}", escape(k), self.render(v)))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
        }
    }
}

//! Parser for the Python-literal text stored in nested catalog cells.
//!
//! Cells look like `[{'id': 35, 'name': 'Comedy'}]` or
//! `{'id': 10, 'name': "Ocean's Collection"}`.  The strict entry points
//! ([`parse_literal`], [`parse_cell`]) report a [`ParseError`]; the
//! extractors recover through [`OrEmpty`] so one bad cell never aborts a run.

use std::fmt;

use log::trace;

use crate::data::model::{Record, Value};
use crate::error::ParseError;

/// Containers nested deeper than this are rejected instead of recursing.
pub const MAX_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Literal – the parsed syntax tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Convert a dict into a [`Record`]; any other literal yields `None`.
    ///
    /// Non-string keys use their literal text.  Containers inside the record
    /// are flattened back to literal text, since records are one level deep.
    pub fn into_record(self) -> Option<Record> {
        let Literal::Dict(entries) = self else {
            return None;
        };
        Some(
            entries
                .into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        Literal::Str(s) => s,
                        other => other.to_string(),
                    };
                    (key, value.into_value())
                })
                .collect(),
        )
    }

    /// Convert a scalar into a cell [`Value`].
    pub fn into_value(self) -> Value {
        match self {
            Literal::None => Value::Null,
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(i) => Value::Integer(i),
            Literal::Float(f) => Value::Float(f),
            Literal::Str(s) => Value::Text(s),
            container => Value::Text(container.to_string()),
        }
    }
}

/// Renders literal text in Python `repr` form.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{v:.1}")
            }
            Literal::Float(v) => write!(f, "{v}"),
            Literal::Str(s) => write_quoted(f, s),
            Literal::List(items) => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            Literal::Tuple(items) => {
                f.write_str("(")?;
                join(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Literal::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Parse one complete literal.  Surrounding whitespace is allowed; anything
/// else after the literal is an error.
pub fn parse_literal(text: &str) -> Result<Literal, ParseError> {
    let mut parser = Parser::new(text);
    let literal = parser.value(0)?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(ParseError::TrailingInput(parser.pos));
    }
    Ok(literal)
}

/// Parse a nested cell into a sequence of elements.
///
/// A list yields its elements; any other literal yields a one-element
/// sequence.  Absent or blank cells yield an empty sequence.
pub fn parse_cell(cell: &Value) -> Result<Vec<Literal>, ParseError> {
    let text = match cell {
        Value::Null => return Ok(Vec::new()),
        Value::Text(s) => s,
        _ => return Err(ParseError::NotText),
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match parse_literal(text)? {
        Literal::List(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

/// Recovery policy for malformed cells: any parse error becomes "no data".
pub trait OrEmpty<T> {
    fn or_empty(self) -> Vec<T>;
}

impl<T> OrEmpty<T> for Result<Vec<T>, ParseError> {
    fn or_empty(self) -> Vec<T> {
        self.unwrap_or_else(|err| {
            trace!("treating malformed cell as empty: {err}");
            Vec::new()
        })
    }
}

/// [`parse_cell`] with malformed input mapped to an empty sequence.
pub fn parse_cell_or_empty(cell: &Value) -> Vec<Literal> {
    parse_cell(cell).or_empty()
}

// ---------------------------------------------------------------------------
// Recursive-descent parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::UnexpectedChar {
                found,
                offset: self.pos,
            },
            None => ParseError::UnexpectedEnd(self.pos),
        }
    }

    fn starts_number(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()),
            _ => false,
        }
    }

    fn value(&mut self, depth: usize) -> Result<Literal, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some('[') => Ok(Literal::List(self.sequence(depth, ']')?.0)),
            // `(x)` is just `x`; `()` and `(x,)` are tuples
            Some('(') => match self.sequence(depth, ')')? {
                (mut items, false) if items.len() == 1 => Ok(items.remove(0)),
                (items, _) => Ok(Literal::Tuple(items)),
            },
            Some('{') => self.dict(depth),
            Some('\'' | '"') => self.string(),
            Some('+' | '-') => self.signed(),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            _ if self.starts_number() => self.number(),
            _ => Err(self.unexpected()),
        }
    }

    fn enter(&mut self, depth: usize) -> Result<usize, ParseError> {
        if depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        self.bump();
        Ok(depth + 1)
    }

    /// Comma-separated items up to `close`, trailing comma allowed.  The flag
    /// reports whether any comma was seen.
    fn sequence(
        &mut self,
        depth: usize,
        close: char,
    ) -> Result<(Vec<Literal>, bool), ParseError> {
        let depth = self.enter(depth)?;
        let mut items = Vec::new();
        let mut comma = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, comma));
            }
            items.push(self.value(depth)?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    comma = true;
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok((items, comma));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn dict(&mut self, depth: usize) -> Result<Literal, ParseError> {
        let depth = self.enter(depth)?;
        let mut entries: Vec<(Literal, Literal)> = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Literal::Dict(entries));
            }
            let offset = self.pos;
            let key = self.value(depth)?;
            check_hashable(&key, offset)?;
            self.skip_ws();
            if self.peek() != Some(':') {
                return Err(self.unexpected());
            }
            self.bump();
            let value = self.value(depth)?;
            // later duplicates win, keeping the first position
            match entries.iter_mut().find(|entry| entry.0 == key) {
                Some((_, slot)) => *slot = value,
                None => entries.push((key, value)),
            }
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(Literal::Dict(entries));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn signed(&mut self) -> Result<Literal, ParseError> {
        let negative = self.bump() == Some('-');
        self.skip_ws();
        if !self.starts_number() {
            return Err(self.unexpected());
        }
        let offset = self.pos;
        match self.number()? {
            Literal::Int(i) if negative => i.checked_neg().map(Literal::Int).ok_or(
                ParseError::InvalidNumber {
                    text: format!("-{i}"),
                    offset,
                },
            ),
            Literal::Float(f) if negative => Ok(Literal::Float(-f)),
            other => Ok(other),
        }
    }

    fn number(&mut self) -> Result<Literal, ParseError> {
        let start = self.pos;
        let mut is_float = false;
        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.digits();
        }

        let text = &self.src[start..self.pos];
        let invalid = || ParseError::InvalidNumber {
            text: text.to_string(),
            offset: start,
        };
        if is_float {
            return text.parse::<f64>().map(Literal::Float).map_err(|_| invalid());
        }
        // Python rejects leading zeros on non-zero decimal integers.
        if text.len() > 1 && text.starts_with('0') && text.chars().any(|c| c != '0') {
            return Err(invalid());
        }
        match text.parse::<i64>() {
            Ok(i) => Ok(Literal::Int(i)),
            // wider than i64: keep the magnitude rather than drop the cell
            Err(_) => text.parse::<f64>().map(Literal::Float).map_err(|_| invalid()),
        }
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn name(&mut self) -> Result<Literal, ParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            other => Err(ParseError::UnknownName(other.to_string())),
        }
    }

    /// A single- or double-quoted string on one line.
    fn string(&mut self) -> Result<Literal, ParseError> {
        let quote = self.bump().ok_or(ParseError::UnexpectedEnd(self.pos))?;
        let mut out = String::new();
        loop {
            let offset = self.pos;
            match self.bump() {
                None => return Err(ParseError::UnexpectedEnd(self.pos)),
                Some(c) if c == quote => return Ok(Literal::Str(out)),
                Some('\n') => {
                    return Err(ParseError::UnexpectedChar {
                        found: '\n',
                        offset,
                    });
                }
                Some('\\') => self.escape(&mut out, offset)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String, offset: usize) -> Result<(), ParseError> {
        let c = self.bump().ok_or(ParseError::UnexpectedEnd(self.pos))?;
        match c {
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'x' => out.push(self.hex_escape(2, offset)?),
            'u' => out.push(self.hex_escape(4, offset)?),
            // unknown escapes are kept verbatim
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, width: usize, offset: usize) -> Result<char, ParseError> {
        let mut code = 0u32;
        for _ in 0..width {
            let digit = self
                .bump()
                .and_then(|d| d.to_digit(16))
                .ok_or(ParseError::InvalidEscape(offset))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(ParseError::InvalidEscape(offset))
    }
}

fn check_hashable(key: &Literal, offset: usize) -> Result<(), ParseError> {
    match key {
        Literal::List(_) | Literal::Dict(_) => Err(ParseError::UnhashableKey(offset)),
        Literal::Tuple(items) => items.iter().try_for_each(|item| check_hashable(item, offset)),
        _ => Ok(()),
    }
}

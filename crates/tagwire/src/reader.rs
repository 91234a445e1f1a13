//! Pull reader over a JSON document.
//!
//! serde_json parses the input once into a [`Node`] tree; [`JsonReader`] then hands the
//! tree out one token at a time. Object members keep document order and duplicates.
//! Reads are lenient the way generated codecs expect: a number can be read as a string
//! and a string holding a number can be read as a number.

use std::iter::Peekable;
use std::vec;

use crate::error::{CodecError, CodecResult};
use crate::node::{Node, Number};
use crate::token::JsonToken;

enum Frame {
    Array {
        items: Peekable<vec::IntoIter<Node>>,
        /// Items consumed so far
        taken: usize,
    },
    Object {
        members: Peekable<vec::IntoIter<(String, Node)>>,
        /// Name of the member being read
        name: Option<String>,
        /// Value of that member, until it is consumed
        value: Option<Node>,
    },
}

/// Reads a JSON document token by token.
pub struct JsonReader {
    root: Option<Node>,
    frames: Vec<Frame>,
    failure: Option<CodecError>,
}

impl JsonReader {
    /// Parses `input`. A malformed document fails the first read.
    pub fn new(input: &str) -> Self {
        let (root, failure) = match serde_json::from_str::<Node>(input) {
            Ok(root) => (Some(root), None),
            Err(err) => (None, Some(CodecError::Syntax(err))),
        };
        Self {
            root,
            frames: Vec::new(),
            failure,
        }
    }

    /// Returns the kind of the next token without consuming it.
    pub fn peek(&mut self) -> CodecResult<JsonToken> {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        Ok(match self.frames.last_mut() {
            None => self.root.as_ref().map_or(JsonToken::EndDocument, Node::token),
            Some(Frame::Array { items, .. }) => {
                items.peek().map_or(JsonToken::EndArray, Node::token)
            }
            Some(Frame::Object {
                value: Some(value), ..
            }) => value.token(),
            Some(Frame::Object { members, .. }) => members
                .peek()
                .map_or(JsonToken::EndObject, |_| JsonToken::Name),
        })
    }

    /// Returns true if the current array or object has another element.
    pub fn has_next(&mut self) -> CodecResult<bool> {
        let token = self.peek()?;
        Ok(!matches!(
            token,
            JsonToken::EndObject | JsonToken::EndArray | JsonToken::EndDocument
        ))
    }

    pub fn begin_object(&mut self) -> CodecResult<()> {
        match self.take(&[JsonToken::BeginObject], JsonToken::BeginObject)? {
            Node::Object(members) => {
                self.frames.push(Frame::Object {
                    members: members.into_iter().peekable(),
                    name: None,
                    value: None,
                });
                Ok(())
            }
            other => Err(self.unexpected(JsonToken::BeginObject, other.token())),
        }
    }

    pub fn end_object(&mut self) -> CodecResult<()> {
        self.close(JsonToken::EndObject)
    }

    pub fn begin_array(&mut self) -> CodecResult<()> {
        match self.take(&[JsonToken::BeginArray], JsonToken::BeginArray)? {
            Node::Array(items) => {
                self.frames.push(Frame::Array {
                    items: items.into_iter().peekable(),
                    taken: 0,
                });
                Ok(())
            }
            other => Err(self.unexpected(JsonToken::BeginArray, other.token())),
        }
    }

    pub fn end_array(&mut self) -> CodecResult<()> {
        self.close(JsonToken::EndArray)
    }

    /// Consumes the next property name. Its value is the next thing to read.
    pub fn next_name(&mut self) -> CodecResult<String> {
        let found = self.peek()?;
        if found != JsonToken::Name {
            return Err(self.unexpected(JsonToken::Name, found));
        }
        match self.frames.last_mut() {
            Some(Frame::Object {
                members,
                name,
                value,
            }) => match members.next() {
                Some((member, node)) => {
                    *name = Some(member.clone());
                    *value = Some(node);
                    Ok(member)
                }
                None => Err(self.unexpected(JsonToken::Name, JsonToken::EndObject)),
            },
            _ => Err(self.unexpected(JsonToken::Name, found)),
        }
    }

    /// Consumes a string value. Numbers are accepted and returned as their decimal text.
    pub fn next_string(&mut self) -> CodecResult<String> {
        match self.take(&[JsonToken::String, JsonToken::Number], JsonToken::String)? {
            Node::String(value) => Ok(value),
            Node::Number(number) => Ok(number.to_string()),
            other => Err(self.unexpected(JsonToken::String, other.token())),
        }
    }

    pub fn next_bool(&mut self) -> CodecResult<bool> {
        match self.take(&[JsonToken::Boolean], JsonToken::Boolean)? {
            Node::Bool(value) => Ok(value),
            other => Err(self.unexpected(JsonToken::Boolean, other.token())),
        }
    }

    pub fn next_null(&mut self) -> CodecResult<()> {
        match self.take(&[JsonToken::Null], JsonToken::Null)? {
            Node::Null => Ok(()),
            other => Err(self.unexpected(JsonToken::Null, other.token())),
        }
    }

    /// Consumes a number that must be integral and fit in an `i64`.
    ///
    /// Literals such as `1.0` or `1e3` are accepted when they denote an integer.
    pub fn next_i64(&mut self) -> CodecResult<i64> {
        match self.next_number()? {
            Number::Int(value) => Ok(value),
            Number::Uint(value) => {
                i64::try_from(value).map_err(|_| self.out_of_range(value.to_string(), "i64"))
            }
            Number::Float(double) => {
                let truncated = double as i64;
                if !(-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&double)
                    || truncated as f64 != double
                {
                    return Err(self.out_of_range(double.to_string(), "i64"));
                }
                Ok(truncated)
            }
        }
    }

    /// Consumes a number that must be integral, non-negative and fit in a `u64`.
    pub fn next_u64(&mut self) -> CodecResult<u64> {
        match self.next_number()? {
            Number::Uint(value) => Ok(value),
            Number::Int(value) => {
                u64::try_from(value).map_err(|_| self.out_of_range(value.to_string(), "u64"))
            }
            Number::Float(double) => {
                let truncated = double as u64;
                if !(0.0..18_446_744_073_709_551_616.0).contains(&double)
                    || truncated as f64 != double
                {
                    return Err(self.out_of_range(double.to_string(), "u64"));
                }
                Ok(truncated)
            }
        }
    }

    pub fn next_f64(&mut self) -> CodecResult<f64> {
        let value = match self.next_number()? {
            Number::Int(value) => value as f64,
            Number::Uint(value) => value as f64,
            Number::Float(value) => value,
        };
        if !value.is_finite() {
            return Err(CodecError::NonFiniteNumber(value));
        }
        Ok(value)
    }

    /// Consumes a number as an `f32`, rounding its shortest decimal form once.
    pub fn next_f32(&mut self) -> CodecResult<f32> {
        let number = self.next_number()?;
        let literal = number.to_string();
        let value = match number {
            Number::Int(value) => value as f32,
            Number::Uint(value) => value as f32,
            Number::Float(_) => literal.parse::<f32>().map_err(|_| CodecError::InvalidNumber {
                value: literal.clone(),
                path: self.path(),
            })?,
        };
        if !value.is_finite() {
            return Err(self.out_of_range(literal, "f32"));
        }
        Ok(value)
    }

    /// Skips the next value together with everything nested in it.
    pub fn skip_value(&mut self) -> CodecResult<()> {
        let found = self.peek()?;
        if !is_value(found) {
            return Err(CodecError::IllegalState(format!(
                "no value to skip before {found} at path {}",
                self.path()
            )));
        }
        self.take(&[found], found).map(drop)
    }

    /// Asserts that the whole document has been consumed.
    pub fn end_document(&mut self) -> CodecResult<()> {
        let found = self.peek()?;
        if found != JsonToken::EndDocument {
            return Err(self.unexpected(JsonToken::EndDocument, found));
        }
        Ok(())
    }

    /// The location of the reader in the document, such as `$.items[2].name`.
    pub fn path(&self) -> String {
        let mut out = String::from("$");
        for frame in &self.frames {
            match frame {
                Frame::Array { taken, .. } => out.push_str(&format!("[{taken}]")),
                Frame::Object {
                    name: Some(name), ..
                } => {
                    out.push('.');
                    out.push_str(name);
                }
                Frame::Object { .. } => {}
            }
        }
        out
    }

    /// Consumes the next value if its token is one of `accepted`.
    fn take(&mut self, accepted: &[JsonToken], expected: JsonToken) -> CodecResult<Node> {
        let found = self.peek()?;
        if !accepted.contains(&found) {
            return Err(self.unexpected(expected, found));
        }
        let node = match self.frames.last_mut() {
            None => self.root.take(),
            Some(Frame::Array { items, taken }) => {
                *taken += 1;
                items.next()
            }
            Some(Frame::Object { value, .. }) => value.take(),
        };
        node.ok_or_else(|| self.unexpected(expected, found))
    }

    fn close(&mut self, expected: JsonToken) -> CodecResult<()> {
        let found = self.peek()?;
        if found != expected {
            return Err(self.unexpected(expected, found));
        }
        self.frames.pop();
        Ok(())
    }

    fn next_number(&mut self) -> CodecResult<Number> {
        match self.take(&[JsonToken::Number, JsonToken::String], JsonToken::Number)? {
            Node::Number(number) => Ok(number),
            Node::String(value) => parse_number(&value).ok_or_else(|| CodecError::InvalidNumber {
                value,
                path: self.path(),
            }),
            other => Err(self.unexpected(JsonToken::Number, other.token())),
        }
    }

    fn unexpected(&self, expected: JsonToken, found: JsonToken) -> CodecError {
        CodecError::UnexpectedToken {
            expected,
            found,
            path: self.path(),
        }
    }

    fn out_of_range(&self, literal: String, target: &'static str) -> CodecError {
        CodecError::NumberOutOfRange {
            literal,
            target,
            path: self.path(),
        }
    }
}

fn is_value(token: JsonToken) -> bool {
    matches!(
        token,
        JsonToken::BeginArray
            | JsonToken::BeginObject
            | JsonToken::String
            | JsonToken::Number
            | JsonToken::Boolean
            | JsonToken::Null
    )
}

/// Reads a number out of a string member, integers first.
fn parse_number(value: &str) -> Option<Number> {
    let value = value.trim();
    if let Ok(int) = value.parse::<i64>() {
        return Some(Number::Int(int));
    }
    if let Ok(uint) = value.parse::<u64>() {
        return Some(Number::Uint(uint));
    }
    value.parse::<f64>().ok().map(Number::Float)
}

//! Parsed form of an input document.
//!
//! Objects keep their members as a list in document order, so a name that occurs twice
//! is still seen twice by the reader.

use std::fmt;

use serde::de::{Deserialize, Deserializer, Error, MapAccess, SeqAccess, Visitor};

use crate::token::JsonToken;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => fmt::Display::fmt(value, f),
            Number::Uint(value) => fmt::Display::fmt(value, f),
            Number::Float(value) => fmt::Display::fmt(value, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
}

impl Node {
    /// The token a reader positioned at this value reports.
    pub(crate) fn token(&self) -> JsonToken {
        match self {
            Node::Null => JsonToken::Null,
            Node::Bool(_) => JsonToken::Boolean,
            Node::Number(_) => JsonToken::Number,
            Node::String(_) => JsonToken::String,
            Node::Array(_) => JsonToken::BeginArray,
            Node::Object(_) => JsonToken::BeginObject,
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: Error>(self, value: bool) -> Result<Node, E> {
        Ok(Node::Bool(value))
    }

    fn visit_i64<E: Error>(self, value: i64) -> Result<Node, E> {
        Ok(Node::Number(Number::Int(value)))
    }

    fn visit_u64<E: Error>(self, value: u64) -> Result<Node, E> {
        Ok(Node::Number(Number::Uint(value)))
    }

    fn visit_f64<E: Error>(self, value: f64) -> Result<Node, E> {
        Ok(Node::Number(Number::Float(value)))
    }

    fn visit_str<E: Error>(self, value: &str) -> Result<Node, E> {
        Ok(Node::String(value.to_owned()))
    }

    fn visit_string<E: Error>(self, value: String) -> Result<Node, E> {
        Ok(Node::String(value))
    }

    fn visit_unit<E: Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E: Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut members = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, Node>()? {
            members.push(entry);
        }
        Ok(Node::Object(members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_members_are_kept_in_order() {
        let node: Node = serde_json::from_str(r#"{"a": 1, "b": true, "a": "x"}"#).unwrap();
        assert_eq!(
            node,
            Node::Object(vec![
                ("a".to_owned(), Node::Number(Number::Uint(1))),
                ("b".to_owned(), Node::Bool(true)),
                ("a".to_owned(), Node::String("x".to_owned())),
            ])
        );
    }

    #[test]
    fn test_number_kinds() {
        let node: Node = serde_json::from_str("[-1, 1, 1.5, 1e3, null]").unwrap();
        assert_eq!(
            node,
            Node::Array(vec![
                Node::Number(Number::Int(-1)),
                Node::Number(Number::Uint(1)),
                Node::Number(Number::Float(1.5)),
                Node::Number(Number::Float(1000.0)),
                Node::Null,
            ])
        );
    }
}

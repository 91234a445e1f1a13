//! Types with generated codecs.

use std::collections::{BTreeMap, HashMap};

use tagwire::JsonCodec;

use self::geometry::Point;

/// Every scalar kind under its own wire name.
#[derive(JsonCodec, Debug, Clone, PartialEq)]
pub struct Item {
    pub some_int: i32,
    pub some_string: String,
    pub some_boolean: bool,
    pub some_double: f64,
    pub some_float: f32,
    pub some_long: i64,
    pub some_short: i16,
    pub some_byte: i8,
    pub some_char: char,
}

/// Only `requiredString` must be present; everything else has a default.
#[derive(JsonCodec, Debug, Clone, PartialEq)]
pub struct ItemWithDefault {
    #[tagwire(rename = "requiredString")]
    pub required_string: String,
    #[tagwire(rename = "someInt", default = 30)]
    pub some_int: i32,
    #[tagwire(rename = "someString", default = "default string")]
    pub some_string: String,
    #[tagwire(rename = "someBoolean", default = false)]
    pub some_boolean: bool,
    #[tagwire(rename = "someDouble", default = 50.0)]
    pub some_double: f64,
    #[tagwire(rename = "someFloat", default = 60.0)]
    pub some_float: f32,
    #[tagwire(rename = "someLong", default = 200)]
    pub some_long: i64,
    #[tagwire(rename = "someShort", default = 20)]
    pub some_short: i16,
    #[tagwire(rename = "someByte", default = 3)]
    pub some_byte: i8,
    #[tagwire(rename = "someChar", default = '\u{6}')]
    pub some_char: char,
}

impl ItemWithDefault {
    /// The value decoded from a document holding only `requiredString`.
    pub fn with_defaults(required_string: impl Into<String>) -> Self {
        Self {
            required_string: required_string.into(),
            some_int: 30,
            some_string: "default string".to_string(),
            some_boolean: false,
            some_double: 50.0,
            some_float: 60.0,
            some_long: 200,
            some_short: 20,
            some_byte: 3,
            some_char: '\u{6}',
        }
    }
}

/// Containers, maps and an optional field.
#[derive(JsonCodec, Debug, Clone, PartialEq, Default)]
pub struct User {
    pub some_string: String,
    pub some_int: i32,
    pub some_long: i64,
    pub some_short: i16,
    pub some_byte: i8,
    pub some_float: f32,
    pub some_double: f64,
    pub some_boolean: bool,
    pub some_integer_list: Vec<i32>,
    pub some_map: HashMap<String, String>,
    pub nested_map: HashMap<String, HashMap<String, String>>,
    pub email: Option<String>,
}

/// Nested generated types, boxed values and a keyword field name.
#[derive(JsonCodec, Debug, Clone, PartialEq)]
pub struct Team {
    pub name: String,
    pub lead: Box<User>,
    pub members: Vec<User>,
    pub ranking: BTreeMap<u32, String>,
    #[tagwire(default)]
    pub location: Option<Point>,
    pub r#type: String,
}

/// Page size of a [`Query`] that names none.
pub const DEFAULT_LIMIT: i32 = 5;

pub(crate) fn default_pages() -> Vec<u32> {
    vec![1]
}

/// Defaults that name items of this module.
#[derive(JsonCodec, Debug, Clone, PartialEq)]
pub struct Query {
    pub term: String,
    #[tagwire(default = DEFAULT_LIMIT)]
    pub limit: i32,
    #[tagwire(default = default_pages())]
    pub pages: Vec<u32>,
    #[tagwire(default = Point::ORIGIN)]
    pub center: Point,
}

/// More fields than one presence word holds, with defaults on both sides of the boundary.
#[derive(JsonCodec, Debug, Clone, PartialEq)]
pub struct Wide {
    #[tagwire(default = -1)]
    pub v00: i32,
    pub v01: i32,
    pub v02: i32,
    pub v03: i32,
    pub v04: i32,
    pub v05: i32,
    pub v06: i32,
    pub v07: i32,
    pub v08: i32,
    pub v09: i32,
    pub v10: i32,
    pub v11: i32,
    pub v12: i32,
    pub v13: i32,
    pub v14: i32,
    pub v15: i32,
    pub v16: i32,
    pub v17: i32,
    pub v18: i32,
    pub v19: i32,
    pub v20: i32,
    pub v21: i32,
    pub v22: i32,
    pub v23: i32,
    pub v24: i32,
    pub v25: i32,
    pub v26: i32,
    pub v27: i32,
    pub v28: i32,
    pub v29: i32,
    pub v30: i32,
    pub v31: i32,
    pub v32: i32,
    #[tagwire(default = 33)]
    pub v33: i32,
    #[tagwire(default = "tail")]
    pub v34: String,
}

pub mod geometry {
    use tagwire::JsonCodec;

    #[derive(JsonCodec, Debug, Clone, Copy, PartialEq)]
    #[tagwire(plain)]
    pub struct Point {
        pub x: f64,
        pub y: f64,
    }

    impl Point {
        pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };
    }
}

use std::fmt;

/// The kind of the next token in a JSON stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonToken {
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    Name,
    String,
    Number,
    Boolean,
    Null,
    EndDocument,
}

impl JsonToken {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonToken::BeginArray => "BEGIN_ARRAY",
            JsonToken::EndArray => "END_ARRAY",
            JsonToken::BeginObject => "BEGIN_OBJECT",
            JsonToken::EndObject => "END_OBJECT",
            JsonToken::Name => "NAME",
            JsonToken::String => "STRING",
            JsonToken::Number => "NUMBER",
            JsonToken::Boolean => "BOOLEAN",
            JsonToken::Null => "NULL",
            JsonToken::EndDocument => "END_DOCUMENT",
        }
    }
}

impl fmt::Display for JsonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

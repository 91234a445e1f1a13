//! Codecs for scalars and standard containers.
//!
//! Scalars are identified by their primitive name (`i32`, `bool`) or, for `String`,
//! by `std::string::String`. Containers use the canonical `std` path of the container
//! with their element types as token arguments.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::{Codec, WireType};
use crate::error::{CodecError, CodecResult};
use crate::reader::JsonReader;
use crate::registry::CodecRegistry;
use crate::token::JsonToken;
use crate::type_token::TypeToken;
use crate::writer::JsonWriter;

pub const STRING: &str = "std::string::String";
pub const VEC: &str = "std::vec::Vec";
pub const OPTION: &str = "std::option::Option";
pub const BOX: &str = "std::boxed::Box";
pub const HASH_MAP: &str = "std::collections::HashMap";
pub const BTREE_MAP: &str = "std::collections::BTreeMap";

trait Scalar: Sized + Send + Sync + 'static {
    const NAME: &'static str;

    fn read(reader: &mut JsonReader) -> CodecResult<Self>;

    fn write(&self, writer: &mut JsonWriter) -> CodecResult<()>;
}

struct ScalarCodec<T>(PhantomData<fn() -> T>);

impl<T: Scalar> Codec<T> for ScalarCodec<T> {
    fn decode(&self, reader: &mut JsonReader) -> CodecResult<Option<T>> {
        if reader.peek()? == JsonToken::Null {
            reader.next_null()?;
            return Ok(None);
        }
        T::read(reader).map(Some)
    }

    fn encode(&self, writer: &mut JsonWriter, value: Option<&T>) -> CodecResult<()> {
        match value {
            Some(value) => value.write(writer),
            None => writer.null_value(),
        }
    }
}

macro_rules! signed_scalars {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const NAME: &'static str = stringify!($ty);

            fn read(reader: &mut JsonReader) -> CodecResult<Self> {
                let wide = reader.next_i64()?;
                <$ty>::try_from(wide).map_err(|_| CodecError::NumberOutOfRange {
                    literal: wide.to_string(),
                    target: Self::NAME,
                    path: reader.path(),
                })
            }

            fn write(&self, writer: &mut JsonWriter) -> CodecResult<()> {
                writer.value_i64(i64::from(*self))
            }
        }
    )*};
}

macro_rules! unsigned_scalars {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const NAME: &'static str = stringify!($ty);

            fn read(reader: &mut JsonReader) -> CodecResult<Self> {
                let wide = reader.next_u64()?;
                <$ty>::try_from(wide).map_err(|_| CodecError::NumberOutOfRange {
                    literal: wide.to_string(),
                    target: Self::NAME,
                    path: reader.path(),
                })
            }

            fn write(&self, writer: &mut JsonWriter) -> CodecResult<()> {
                writer.value_u64(u64::from(*self))
            }
        }
    )*};
}

signed_scalars!(i8, i16, i32, i64);
unsigned_scalars!(u8, u16, u32, u64);

impl Scalar for f32 {
    const NAME: &'static str = "f32";

    fn read(reader: &mut JsonReader) -> CodecResult<Self> {
        reader.next_f32()
    }

    fn write(&self, writer: &mut JsonWriter) -> CodecResult<()> {
        writer.value_f32(*self)
    }
}

impl Scalar for f64 {
    const NAME: &'static str = "f64";

    fn read(reader: &mut JsonReader) -> CodecResult<Self> {
        reader.next_f64()
    }

    fn write(&self, writer: &mut JsonWriter) -> CodecResult<()> {
        writer.value_f64(*self)
    }
}

impl Scalar for bool {
    const NAME: &'static str = "bool";

    fn read(reader: &mut JsonReader) -> CodecResult<Self> {
        reader.next_bool()
    }

    fn write(&self, writer: &mut JsonWriter) -> CodecResult<()> {
        writer.value_bool(*self)
    }
}

impl Scalar for char {
    const NAME: &'static str = "char";

    fn read(reader: &mut JsonReader) -> CodecResult<Self> {
        let value = reader.next_string()?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(CodecError::InvalidCharacter {
                value,
                path: reader.path(),
            }),
        }
    }

    fn write(&self, writer: &mut JsonWriter) -> CodecResult<()> {
        let mut buf = [0u8; 4];
        writer.value_str(self.encode_utf8(&mut buf))
    }
}

impl Scalar for String {
    const NAME: &'static str = STRING;

    fn read(reader: &mut JsonReader) -> CodecResult<Self> {
        reader.next_string()
    }

    fn write(&self, writer: &mut JsonWriter) -> CodecResult<()> {
        writer.value_str(self)
    }
}

macro_rules! scalar_wire_types {
    ($($ty:ty),* $(,)?) => {$(
        impl WireType for $ty {
            fn type_token() -> TypeToken {
                TypeToken::of(<$ty as Scalar>::NAME)
            }

            fn default_codec(
                _registry: &CodecRegistry,
                _token: &TypeToken,
            ) -> CodecResult<Arc<dyn Codec<Self>>> {
                Ok(Arc::new(ScalarCodec::<$ty>(PhantomData)))
            }
        }
    )*};
}

scalar_wire_types!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, char, String);

fn parameterized(raw: &'static str, args: Vec<TypeToken>) -> TypeToken {
    TypeToken::parameterized_with_owner(None, TypeToken::of(raw), args)
}

fn unexpected_null<T>(reader: &JsonReader) -> CodecError {
    CodecError::UnexpectedNull {
        type_name: std::any::type_name::<T>().to_owned(),
        path: reader.path(),
    }
}

struct OptionCodec<T> {
    inner: Arc<dyn Codec<T>>,
}

impl<T> Codec<Option<T>> for OptionCodec<T> {
    fn decode(&self, reader: &mut JsonReader) -> CodecResult<Option<Option<T>>> {
        if reader.peek()? == JsonToken::Null {
            reader.next_null()?;
            return Ok(Some(None));
        }
        self.inner.decode(reader).map(Some)
    }

    fn encode(&self, writer: &mut JsonWriter, value: Option<&Option<T>>) -> CodecResult<()> {
        match value {
            Some(Some(value)) => self.inner.encode(writer, Some(value)),
            _ => writer.null_value(),
        }
    }
}

impl<T: WireType> WireType for Option<T> {
    fn type_token() -> TypeToken {
        parameterized(OPTION, vec![T::type_token()])
    }

    fn default_codec(
        registry: &CodecRegistry,
        token: &TypeToken,
    ) -> CodecResult<Arc<dyn Codec<Self>>> {
        let inner = registry.codec::<T>(token.arg(0)?)?;
        Ok(Arc::new(OptionCodec { inner }))
    }
}

struct BoxCodec<T> {
    inner: Arc<dyn Codec<T>>,
}

impl<T> Codec<Box<T>> for BoxCodec<T> {
    fn decode(&self, reader: &mut JsonReader) -> CodecResult<Option<Box<T>>> {
        Ok(self.inner.decode(reader)?.map(Box::new))
    }

    fn encode(&self, writer: &mut JsonWriter, value: Option<&Box<T>>) -> CodecResult<()> {
        self.inner.encode(writer, value.map(|boxed| &**boxed))
    }
}

impl<T: WireType> WireType for Box<T> {
    fn type_token() -> TypeToken {
        parameterized(BOX, vec![T::type_token()])
    }

    fn default_codec(
        registry: &CodecRegistry,
        token: &TypeToken,
    ) -> CodecResult<Arc<dyn Codec<Self>>> {
        let inner = registry.codec::<T>(token.arg(0)?)?;
        Ok(Arc::new(BoxCodec { inner }))
    }
}

struct VecCodec<T> {
    element: Arc<dyn Codec<T>>,
}

impl<T> Codec<Vec<T>> for VecCodec<T> {
    fn decode(&self, reader: &mut JsonReader) -> CodecResult<Option<Vec<T>>> {
        if reader.peek()? == JsonToken::Null {
            reader.next_null()?;
            return Ok(None);
        }
        let mut items = Vec::new();
        reader.begin_array()?;
        while reader.has_next()? {
            match self.element.decode(reader)? {
                Some(item) => items.push(item),
                None => return Err(unexpected_null::<T>(reader)),
            }
        }
        reader.end_array()?;
        Ok(Some(items))
    }

    fn encode(&self, writer: &mut JsonWriter, value: Option<&Vec<T>>) -> CodecResult<()> {
        let Some(items) = value else {
            return writer.null_value();
        };
        writer.begin_array()?;
        for item in items {
            self.element.encode(writer, Some(item))?;
        }
        writer.end_array()
    }
}

impl<T: WireType> WireType for Vec<T> {
    fn type_token() -> TypeToken {
        parameterized(VEC, vec![T::type_token()])
    }

    fn default_codec(
        registry: &CodecRegistry,
        token: &TypeToken,
    ) -> CodecResult<Arc<dyn Codec<Self>>> {
        let element = registry.codec::<T>(token.arg(0)?)?;
        Ok(Arc::new(VecCodec { element }))
    }
}

/// Types usable as JSON object keys in map fields.
pub trait MapKey: WireType {
    fn to_key(&self) -> String;

    fn from_key(key: &str) -> Option<Self>;
}

impl MapKey for String {
    fn to_key(&self) -> String {
        self.clone()
    }

    fn from_key(key: &str) -> Option<Self> {
        Some(key.to_owned())
    }
}

macro_rules! parsed_map_keys {
    ($($ty:ty),* $(,)?) => {$(
        impl MapKey for $ty {
            fn to_key(&self) -> String {
                self.to_string()
            }

            fn from_key(key: &str) -> Option<Self> {
                key.parse().ok()
            }
        }
    )*};
}

parsed_map_keys!(i8, i16, i32, i64, u8, u16, u32, u64, bool, char);

trait JsonMap: Default + Send + Sync + 'static {
    type Key: MapKey;
    type Value: WireType;

    /// Inserts unless the key is already present. Returns false on a duplicate.
    fn insert_new(&mut self, key: Self::Key, value: Self::Value) -> bool;

    fn entries(&self) -> impl Iterator<Item = (&Self::Key, &Self::Value)>;
}

impl<K: MapKey + Eq + Hash, V: WireType> JsonMap for HashMap<K, V> {
    type Key = K;
    type Value = V;

    fn insert_new(&mut self, key: K, value: V) -> bool {
        match self.entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.iter()
    }
}

impl<K: MapKey + Ord, V: WireType> JsonMap for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn insert_new(&mut self, key: K, value: V) -> bool {
        match self.entry(key) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.iter()
    }
}

/// Maps are written as JSON objects whose member names are the stringified keys.
struct MapCodec<M: JsonMap> {
    value: Arc<dyn Codec<M::Value>>,
}

impl<M: JsonMap> Codec<M> for MapCodec<M> {
    fn decode(&self, reader: &mut JsonReader) -> CodecResult<Option<M>> {
        if reader.peek()? == JsonToken::Null {
            reader.next_null()?;
            return Ok(None);
        }
        let mut map = M::default();
        reader.begin_object()?;
        while reader.has_next()? {
            let name = reader.next_name()?;
            let key = <M::Key as MapKey>::from_key(&name).ok_or_else(|| CodecError::InvalidMapKey {
                key: name.to_string(),
                target: std::any::type_name::<M::Key>(),
                path: reader.path(),
            })?;
            let Some(value) = self.value.decode(reader)? else {
                return Err(unexpected_null::<M::Value>(reader));
            };
            if !map.insert_new(key, value) {
                return Err(CodecError::DuplicateKey {
                    key: name,
                    path: reader.path(),
                });
            }
        }
        reader.end_object()?;
        Ok(Some(map))
    }

    fn encode(&self, writer: &mut JsonWriter, value: Option<&M>) -> CodecResult<()> {
        let Some(map) = value else {
            return writer.null_value();
        };
        writer.begin_object()?;
        for (key, value) in map.entries() {
            writer.name(&key.to_key())?;
            self.value.encode(writer, Some(value))?;
        }
        writer.end_object()
    }
}

fn map_codec<M: JsonMap>(registry: &CodecRegistry, token: &TypeToken) -> CodecResult<Arc<dyn Codec<M>>> {
    // keys never go through a codec, but the token must still name them
    token.arg(0)?;
    let value = registry.codec::<M::Value>(token.arg(1)?)?;
    Ok(Arc::new(MapCodec::<M> { value }))
}

impl<K: MapKey + Eq + Hash, V: WireType> WireType for HashMap<K, V> {
    fn type_token() -> TypeToken {
        parameterized(HASH_MAP, vec![K::type_token(), V::type_token()])
    }

    fn default_codec(
        registry: &CodecRegistry,
        token: &TypeToken,
    ) -> CodecResult<Arc<dyn Codec<Self>>> {
        map_codec::<Self>(registry, token)
    }
}

impl<K: MapKey + Ord, V: WireType> WireType for BTreeMap<K, V> {
    fn type_token() -> TypeToken {
        parameterized(BTREE_MAP, vec![K::type_token(), V::type_token()])
    }

    fn default_codec(
        registry: &CodecRegistry,
        token: &TypeToken,
    ) -> CodecResult<Arc<dyn Codec<Self>>> {
        map_codec::<Self>(registry, token)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;

    fn round_trip<T: WireType>(value: &T) -> (String, Option<T>) {
        let registry = CodecRegistry::new();
        let json = registry.to_json(Some(value)).unwrap();
        let back = registry.from_json::<T>(&json).unwrap();
        (json, back)
    }

    #[test_case("127", Some(127) ; "max")]
    #[test_case("-128", Some(-128) ; "min")]
    #[test_case("null", None ; "null")]
    fn test_i8_decode(json: &str, expected: Option<i8>) {
        assert_eq!(CodecRegistry::new().from_json::<i8>(json).unwrap(), expected);
    }

    #[test_case("128" ; "above max")]
    #[test_case("-129" ; "below min")]
    fn test_i8_out_of_range(json: &str) {
        let err = CodecRegistry::new().from_json::<i8>(json).unwrap_err();
        assert!(matches!(err, CodecError::NumberOutOfRange { target: "i8", .. }));
    }

    #[test]
    fn test_char_requires_single_character() {
        let registry = CodecRegistry::new();
        assert_eq!(registry.from_json::<char>("\"x\"").unwrap(), Some('x'));
        assert!(matches!(
            registry.from_json::<char>("\"xy\""),
            Err(CodecError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn test_vec_of_option_keeps_nulls() {
        let (json, back) = round_trip(&vec![Some(1i32), None, Some(3)]);
        assert_eq!(json, "[1,null,3]");
        assert_eq!(back, Some(vec![Some(1), None, Some(3)]));
    }

    #[test]
    fn test_vec_rejects_null_element() {
        let err = CodecRegistry::new()
            .from_json::<Vec<i32>>("[1,null]")
            .unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedNull { .. }));
    }

    #[test]
    fn test_btree_map_with_integer_keys() {
        let map: BTreeMap<u32, String> = [(2, "b".to_owned()), (1, "a".to_owned())].into();
        let (json, back) = round_trip(&map);
        assert_eq!(json, r#"{"1":"a","2":"b"}"#);
        assert_eq!(back, Some(map));
    }

    #[test]
    fn test_map_rejects_duplicate_key() {
        let err = CodecRegistry::new()
            .from_json::<HashMap<String, i32>>(r#"{"a":1,"a":2}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::DuplicateKey { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_map_rejects_unparseable_key() {
        let err = CodecRegistry::new()
            .from_json::<HashMap<i32, i32>>(r#"{"x":1}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidMapKey { .. }));
    }

    #[test]
    fn test_nested_container_token() {
        assert_eq!(
            <Vec<HashMap<String, Box<i64>>>>::type_token().to_string(),
            "std::vec::Vec<std::collections::HashMap<std::string::String, std::boxed::Box<i64>>>"
        );
    }

    proptest! {
        #[test]
        fn prop_string_round_trip(value in ".*") {
            let (_, back) = round_trip(&value);
            prop_assert_eq!(back, Some(value));
        }

        #[test]
        fn prop_f64_round_trip(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let (_, back) = round_trip(&value);
            prop_assert_eq!(back, Some(value));
        }

        #[test]
        fn prop_f32_round_trip(value in proptest::num::f32::NORMAL) {
            let (_, back) = round_trip(&value);
            prop_assert_eq!(back, Some(value));
        }

        #[test]
        fn prop_i64_round_trip(value in any::<i64>()) {
            let (_, back) = round_trip(&value);
            prop_assert_eq!(back, Some(value));
        }
    }
}

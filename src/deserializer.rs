//! Serde deserializer implementation for parsed configuration trees
//!
//! Every leaf in the tree is a string, so primitive targets are parsed from
//! the scalar text on demand. A lone scalar is accepted wherever a sequence
//! is expected, because a key assigned once is never wrapped in a list.

use crate::error::{DeError, VyattaError};
use crate::parser::{ConfigBlock, ConfigValue, VyattaParser};
use serde::de::value::MapAccessDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};

/// Parses `input` and deserializes the resulting tree into `T`
pub fn from_str<T>(input: &str) -> Result<T, VyattaError>
where
    T: DeserializeOwned,
{
    let block = VyattaParser::new(input).parse()?;
    Ok(from_block(block)?)
}

/// Deserializes an already parsed tree into `T`
pub fn from_block<T>(block: ConfigBlock) -> Result<T, DeError>
where
    T: DeserializeOwned,
{
    from_value(ConfigValue::Block(block))
}

/// Deserializes a single configuration value into `T`
pub fn from_value<T>(value: ConfigValue) -> Result<T, DeError>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value, String::new()))
}

/// Deserializer over an owned [`ConfigValue`]
pub struct ValueDeserializer {
    value: ConfigValue,
    /// Dotted key path of `value`, used in error messages
    path: String,
}

impl ValueDeserializer {
    /// Creates a deserializer for `value` located at `path`
    pub fn new(value: ConfigValue, path: String) -> Self {
        Self { value, path }
    }

    fn mismatch(&self, expected: &str) -> DeError {
        DeError::TypeMismatch {
            expected: expected.to_string(),
            found: self.value.kind_name().to_string(),
            path: display_path(&self.path),
        }
    }

    /// Returns the scalar text or a type mismatch error
    fn into_scalar(self, expected: &str) -> Result<(String, String), DeError> {
        match self.value {
            ConfigValue::Scalar(s) => Ok((s, self.path)),
            _ => Err(self.mismatch(expected)),
        }
    }

    fn parse_scalar<T>(self, expected: &str) -> Result<T, DeError>
    where
        T: std::str::FromStr,
    {
        let (text, path) = self.into_scalar(expected)?;
        text.trim().parse().map_err(|_| DeError::InvalidScalar {
            value: text,
            expected: expected.to_string(),
            path: display_path(&path),
        })
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident : $ty:ty),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
            where
                V: Visitor<'de>,
            {
                let value: $ty = self.parse_scalar(stringify!($ty))?;
                visitor.$visit(value)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = DeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            ConfigValue::Scalar(s) => visitor.visit_string(s),
            ConfigValue::List(items) => visitor.visit_seq(ValueSeqAccess::new(
                items.into_iter().map(ConfigValue::Scalar),
                self.path,
            )),
            ConfigValue::Block(block) => visitor.visit_map(BlockAccess::new(block, self.path)),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let (text, path) = self.into_scalar("boolean")?;
        match text.trim() {
            "true" | "enable" | "yes" => visitor.visit_bool(true),
            "false" | "disable" | "no" => visitor.visit_bool(false),
            _ => Err(DeError::InvalidScalar {
                value: text,
                expected: "boolean".to_string(),
                path: display_path(&path),
            }),
        }
    }

    deserialize_number! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let value: char = self.parse_scalar("single character")?;
        visitor.visit_char(value)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let (text, _) = self.into_scalar("string")?;
        visitor.visit_string(text)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        // Absent keys never reach the deserializer, so a present value is always Some
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match &self.value {
            ConfigValue::Scalar(s) if s.is_empty() => visitor.visit_unit(),
            ConfigValue::Block(block) if block.is_empty() => visitor.visit_unit(),
            _ => Err(self.mismatch("valueless flag")),
        }
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            ConfigValue::Scalar(s) => visitor.visit_seq(ValueSeqAccess::new(
                std::iter::once(ConfigValue::Scalar(s)),
                self.path,
            )),
            ConfigValue::List(items) => visitor.visit_seq(ValueSeqAccess::new(
                items.into_iter().map(ConfigValue::Scalar),
                self.path,
            )),
            // Named children in header order, e.g. every `ethernet <name> { }`
            ConfigValue::Block(block) => {
                visitor.visit_seq(ValueSeqAccess::new(block.into_values(), self.path))
            }
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            ConfigValue::Block(block) => visitor.visit_map(BlockAccess::new(block, self.path)),
            _ => Err(self.mismatch("block")),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            // Unit variant
            ConfigValue::Scalar(s) => {
                let variant: de::value::StringDeserializer<DeError> = s.into_deserializer();
                visitor.visit_enum(variant)
            }
            // Data variant (block with a single key)
            ConfigValue::Block(block) if block.len() == 1 => visitor.visit_enum(
                MapAccessDeserializer::new(BlockAccess::new(block, self.path)),
            ),
            ConfigValue::Block(ref block) => Err(DeError::TypeMismatch {
                expected: "enum (scalar or single-key block)".to_string(),
                found: format!("block with {} keys", block.len()),
                path: display_path(&self.path),
            }),
            ConfigValue::List(_) => Err(self.mismatch("enum (scalar or single-key block)")),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Sequence access over list items, a lone scalar, or block children
struct ValueSeqAccess<I> {
    values: I,
    path: String,
    index: usize,
}

impl<I> ValueSeqAccess<I>
where
    I: Iterator<Item = ConfigValue>,
{
    fn new(values: I, path: String) -> Self {
        Self {
            values,
            path,
            index: 0,
        }
    }
}

impl<'de, I> de::SeqAccess<'de> for ValueSeqAccess<I>
where
    I: Iterator<Item = ConfigValue>,
{
    type Error = DeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.values.next() {
            Some(value) => {
                let path = format!("{}[{}]", self.path, self.index);
                self.index += 1;
                seed.deserialize(ValueDeserializer::new(value, path)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        let (lower, upper) = self.values.size_hint();
        upper.or(Some(lower))
    }
}

/// Map access over a block's entries
struct BlockAccess {
    entries: indexmap::map::IntoIter<String, ConfigValue>,
    current: Option<(String, ConfigValue)>,
    path: String,
}

impl BlockAccess {
    fn new(block: ConfigBlock, path: String) -> Self {
        Self {
            entries: block.into_iter(),
            current: None,
            path,
        }
    }
}

impl<'de> de::MapAccess<'de> for BlockAccess {
    type Error = DeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, value)) => {
                let path = child_path(&self.path, &key);
                let key_deserializer =
                    ValueDeserializer::new(ConfigValue::Scalar(key.clone()), path);
                self.current = Some((key, value));
                seed.deserialize(key_deserializer).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.current.take() {
            Some((key, value)) => {
                seed.deserialize(ValueDeserializer::new(value, child_path(&self.path, &key)))
            }
            None => Err(DeError::Custom(
                "No value available for map entry".to_string(),
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "kebab-case")]
    struct Ssh {
        port: u16,
        protocol_version: Option<String>,
        disable_password_authentication: Option<()>,
    }

    #[test]
    fn test_numbers_parse_from_scalars() {
        let ssh: Ssh = from_str("port 22\nprotocol-version v2").unwrap();
        assert_eq!(
            ssh,
            Ssh {
                port: 22,
                protocol_version: Some("v2".to_string()),
                disable_password_authentication: None,
            }
        );
    }

    #[test]
    fn test_valueless_flag_as_unit() {
        let ssh: Ssh = from_str("port 2222\ndisable-password-authentication").unwrap();
        assert_eq!(ssh.disable_password_authentication, Some(()));
    }

    #[test]
    fn test_scalar_accepted_as_sequence() {
        #[derive(Debug, Deserialize)]
        struct Eth {
            address: Vec<String>,
        }

        let one: Eth = from_str("address 10.0.0.1/24").unwrap();
        assert_eq!(one.address, ["10.0.0.1/24"]);

        let two: Eth = from_str("address 10.0.0.1/24\naddress 10.0.1.1/24").unwrap();
        assert_eq!(two.address, ["10.0.0.1/24", "10.0.1.1/24"]);
    }

    #[test]
    fn test_numeric_map_keys() {
        let keys: HashMap<u32, HashMap<String, String>> =
            from_str("1 {\n  md5-key abc\n}\n2 {\n  md5-key def\n}").unwrap();
        assert_eq!(keys[&1]["md5-key"], "abc");
        assert_eq!(keys[&2]["md5-key"], "def");
    }

    #[test]
    fn test_bool_keywords() {
        #[derive(Debug, Deserialize)]
        struct Flags {
            a: bool,
            b: bool,
            c: bool,
        }

        let flags: Flags = from_str("a enable\nb no\nc true").unwrap();
        assert!(flags.a);
        assert!(!flags.b);
        assert!(flags.c);
    }

    #[test]
    fn test_unit_enum_from_scalar() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "lowercase")]
        #[allow(dead_code)]
        enum Duplex {
            Auto,
            Half,
            Full,
        }

        #[derive(Debug, Deserialize)]
        struct Eth {
            duplex: Duplex,
        }

        let eth: Eth = from_str("duplex full").unwrap();
        assert_eq!(eth.duplex, Duplex::Full);
    }

    #[test]
    fn test_invalid_scalar_reports_path() {
        #[derive(Debug, Deserialize)]
        struct Service {
            #[allow(dead_code)]
            ssh: Ssh,
        }

        let err = from_str::<Service>("ssh {\n  port twenty-two\n}").unwrap_err();
        assert_eq!(
            err,
            VyattaError::De(DeError::InvalidScalar {
                value: "twenty-two".to_string(),
                expected: "u16".to_string(),
                path: "ssh.port".to_string(),
            })
        );
    }

    #[test]
    fn test_block_where_scalar_expected() {
        #[derive(Debug, Deserialize)]
        struct Eth {
            #[allow(dead_code)]
            description: String,
        }

        let err = from_str::<Eth>("description {\n}").unwrap_err();
        assert_eq!(
            err,
            VyattaError::De(DeError::TypeMismatch {
                expected: "string".to_string(),
                found: "block".to_string(),
                path: "description".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_errors_pass_through() {
        let err = from_str::<HashMap<String, String>>("a {\n").unwrap_err();
        assert!(matches!(err, VyattaError::Parse(_)));
    }
}

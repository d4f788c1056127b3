use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Key used for attributes built from malformed argument lists.
pub const BAD_KEY: &str = "!BADKEY";

/// Value half of an [`Attr`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Time(DateTime<Utc>),
    /// Nested attributes rendered as a sub-object.
    Group(Vec<Attr>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Time(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Group(attrs) => {
                f.write_str("[")?;
                for (i, a) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}={}", a.key, a.value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::Time(v) => {
                serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Group(attrs) => serialize_attrs(attrs, serializer),
        }
    }
}

/// Serializes attributes as a map, keeping order and repeated keys.
pub(crate) fn serialize_attrs<S: Serializer>(attrs: &[Attr], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(attrs.len()))?;
    for a in attrs {
        map.serialize_entry(&a.key, &a.value)?;
    }
    map.end()
}

macro_rules! value_from {
    ($($t:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $conv)
                }
            }
        )*
    };
}

value_from! {
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    isize => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    usize => U64 as u64,
    f32 => F64 as f64,
    f64 => F64 as f64,
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(v: Vec<Attr>) -> Self {
        Value::Group(v)
    }
}

/// A single key/value pair attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Attr { key: key.into(), value: value.into() }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Attr::new(key, Value::String(value.into()))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Attr::new(key, Value::I64(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Attr::new(key, Value::U64(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Attr::new(key, Value::F64(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Attr::new(key, Value::Bool(value))
    }

    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Attr::new(key, Value::Group(attrs))
    }
}

/// One element of a loosely-typed argument list, see [`args_to_attrs`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Attr(Attr),
    Str(String),
    Value(Value),
}

impl Arg {
    fn into_value(self) -> Value {
        match self {
            Arg::Attr(a) => Value::Group(vec![a]),
            Arg::Str(s) => Value::String(s),
            Arg::Value(v) => v,
        }
    }
}

impl From<Attr> for Arg {
    fn from(a: Attr) -> Self {
        Arg::Attr(a)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Str(s.clone())
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Arg::Str(s),
            v => Arg::Value(v),
        }
    }
}

macro_rules! arg_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

arg_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, DateTime<Utc>);

/// Builds a `Vec<Arg>` from a heterogeneous list of keys, values and [`Attr`]s.
///
/// ```
/// use tracing_log_middleware::{args, attr::{args_to_attrs, Attr}};
///
/// let args = args!["user", "alice", Attr::int("request_id", 12), "retries", 3];
/// assert_eq!(args.len(), 5);
///
/// let keys: Vec<_> = args_to_attrs(args).into_iter().map(|a| a.key).collect();
/// assert_eq!(keys, ["user", "request_id", "retries"]);
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::attr::Arg>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::attr::Arg::from($arg)),+]
    };
}

/// Normalizes an argument list into attributes.
///
/// Prebuilt attrs pass through. A string followed by another argument
/// becomes a key/value pair. Anything else (a dangling string, or a value
/// in key position) is kept under [`BAD_KEY`]. Never fails.
pub fn args_to_attrs(args: impl IntoIterator<Item = Arg>) -> Vec<Attr> {
    let mut args = args.into_iter();
    let mut attrs = Vec::new();
    while let Some(arg) = args.next() {
        match arg {
            Arg::Attr(a) => attrs.push(a),
            Arg::Str(key) => match args.next() {
                Some(value) => attrs.push(Attr { key, value: value.into_value() }),
                None => attrs.push(Attr::string(BAD_KEY, key)),
            },
            Arg::Value(v) => attrs.push(Attr { key: BAD_KEY.to_string(), value: v }),
        }
    }
    attrs
}

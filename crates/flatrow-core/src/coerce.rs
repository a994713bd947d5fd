//! Conversion between column text and [`Value`]s.
//!
//! Decoding dispatches on a field's [`Kind`]; encoding renders a value's
//! natural text. Types that need their own text form implement
//! [`Unmarshal`] and [`Marshal`] instead of going through this module.

use crate::error::{BoxError, CoerceError};
use crate::value::{Kind, Scalar, Value};

/// Text rendered for an absent optional.
pub const NIL: &str = "nil";

/// Custom decode capability for a field type.
pub trait Unmarshal: Sized {
    fn unmarshal(text: &str) -> Result<Self, BoxError>;
}

/// Custom encode capability for a field type.
pub trait Marshal {
    fn marshal(&self) -> Result<String, BoxError>;
}

impl<T: Unmarshal> Unmarshal for Option<T> {
    fn unmarshal(text: &str) -> Result<Self, BoxError> {
        T::unmarshal(text).map(Some)
    }
}

impl<T: Marshal> Marshal for Option<T> {
    fn marshal(&self) -> Result<String, BoxError> {
        match self {
            Some(v) => v.marshal(),
            None => Ok(NIL.to_string()),
        }
    }
}

/// Decode one column string according to `kind`.
pub fn decode(kind: &Kind, text: &str) -> Result<Value, CoerceError> {
    match kind {
        Kind::Scalar(scalar) => parse_scalar(*scalar, text).ok_or_else(|| {
            CoerceError::Unparsable {
                text: text.to_string(),
                kind: kind.clone(),
            }
        }),
        Kind::List(inner) => {
            let Kind::Scalar(scalar) = **inner else {
                return Err(CoerceError::Unsupported(kind.clone()));
            };
            decode_list(scalar, inner, text)
        }
        Kind::Optional(inner) => match **inner {
            Kind::Scalar(_) => decode(inner, text),
            _ => Err(CoerceError::Unsupported(kind.clone())),
        },
        Kind::Custom => Err(CoerceError::Unsupported(kind.clone())),
    }
}

fn decode_list(scalar: Scalar, inner: &Kind, text: &str) -> Result<Value, CoerceError> {
    list_items(text)
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            parse_scalar(scalar, item).ok_or_else(|| CoerceError::UnparsableItem {
                index,
                text: item.to_string(),
                kind: inner.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

/// Split a list cell into its items.
///
/// One matching `[]` or `{}` pair is removed first and an empty body has no
/// items. Items containing ',' themselves are not supported.
pub(crate) fn list_items(text: &str) -> Vec<&str> {
    let body = strip_brackets(text);
    if body.is_empty() {
        return Vec::new();
    }
    body.split(',').collect()
}

/// Join rendered items into a list cell.
pub(crate) fn render_list(items: &[String]) -> String {
    format!("[{}]", items.join(","))
}

/// Remove one matching pair of `[]` or `{}` around a list cell.
fn strip_brackets(text: &str) -> &str {
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let Some(body) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return body;
        }
    }
    text
}

fn parse_scalar(scalar: Scalar, text: &str) -> Option<Value> {
    let value = match scalar {
        Scalar::Bool => Value::Bool(parse_bool(text)?),
        Scalar::I8 => Value::I8(text.parse().ok()?),
        Scalar::I16 => Value::I16(text.parse().ok()?),
        Scalar::I32 => Value::I32(text.parse().ok()?),
        Scalar::I64 => Value::I64(text.parse().ok()?),
        Scalar::Isize => Value::Isize(text.parse().ok()?),
        Scalar::U8 => Value::U8(text.parse().ok()?),
        Scalar::U16 => Value::U16(text.parse().ok()?),
        Scalar::U32 => Value::U32(text.parse().ok()?),
        Scalar::U64 => Value::U64(text.parse().ok()?),
        Scalar::Usize => Value::Usize(text.parse().ok()?),
        Scalar::F32 => Value::F32(text.parse().ok()?),
        Scalar::F64 => Value::F64(text.parse().ok()?),
        Scalar::Str => Value::Str(text.to_string()),
    };
    Some(value)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Render a value as column text.
pub fn render(value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::Isize(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::Usize(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Str(v) => v.clone(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(render).collect();
            render_list(&items)
        }
        Value::Absent => NIL.to_string(),
    }
}

/// Prefix every occurrence of `delimiter` in `text` with a backslash.
///
/// Applied before the row sink's own quoting.
pub fn escape_delimiter(text: String, delimiter: u8) -> String {
    let delimiter = char::from(delimiter);
    if !text.contains(delimiter) {
        return text;
    }

    let mut escaped = String::with_capacity(text.len() + 1);
    for c in text.chars() {
        if c == delimiter {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

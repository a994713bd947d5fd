//! Typed cell values: the intermediate form between column text and record fields.
//!
//! Every supported field type converts to and from a [`Value`], and declares
//! a [`Kind`] that the coercion layer dispatches on.

use std::fmt;

/// A decoded cell.
///
/// One variant per supported scalar, plus lists of scalars and the absent
/// optional.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Str(String),
    List(Vec<Value>),
    Absent,
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Primitive kinds with a built-in text coercion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Str,
}

impl Scalar {
    pub fn name(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::I8 => "i8",
            Scalar::I16 => "i16",
            Scalar::I32 => "i32",
            Scalar::I64 => "i64",
            Scalar::Isize => "isize",
            Scalar::U8 => "u8",
            Scalar::U16 => "u16",
            Scalar::U32 => "u32",
            Scalar::U64 => "u64",
            Scalar::Usize => "usize",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
            Scalar::Str => "String",
        }
    }
}

/// Structural kind of a field, used to pick its coercion rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Scalar(Scalar),
    /// Homogeneous sequence.
    List(Box<Kind>),
    /// Nullable value.
    Optional(Box<Kind>),
    /// Coercion is delegated to the type's own `Unmarshal`/`Marshal` impls.
    Custom,
}

impl Kind {
    /// Whether the coercion layer has a rule for this kind.
    ///
    /// Lists and optionals are only supported one level deep, over scalars.
    pub fn is_supported(&self) -> bool {
        match self {
            Kind::Scalar(_) | Kind::Custom => true,
            Kind::List(inner) => matches!(**inner, Kind::Scalar(_) | Kind::Custom),
            Kind::Optional(inner) => matches!(**inner, Kind::Scalar(_)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar(scalar) => f.write_str(scalar.name()),
            Kind::List(inner) => write!(f, "Vec<{inner}>"),
            Kind::Optional(inner) => write!(f, "Option<{inner}>"),
            Kind::Custom => f.write_str("custom"),
        }
    }
}

/// A Rust type that can be stored in a record field using built-in coercion.
pub trait FieldType: Sized + Send + Sync + 'static {
    fn kind() -> Kind;

    /// Convert a decoded value back into the field type.
    ///
    /// Returns `None` when the value's variant does not belong to this type.
    fn from_value(value: Value) -> Option<Self>;

    fn to_value(&self) -> Value;
}

macro_rules! scalar_field {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn kind() -> Kind {
                    Kind::Scalar(Scalar::$variant)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn to_value(&self) -> Value {
                    Value::$variant(<$ty as Clone>::clone(self))
                }
            }
        )*
    };
}

scalar_field! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => Str,
}

impl<T: FieldType> FieldType for Vec<T> {
    fn kind() -> Kind {
        Kind::List(Box::new(T::kind()))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldType::to_value).collect())
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn kind() -> Kind {
        Kind::Optional(Box::new(T::kind()))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Absent => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Absent,
        }
    }
}

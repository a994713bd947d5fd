//! # Record Macros
//!
//! ## flat_record!
//!
//! Declares a struct and implements [`Record`](crate::Record) for it from
//! per-field `#[flat(...)]` column tags.
//!
//! ### Usage
//!
//! ```ignore
//! use flatrow_core::flat_record;
//!
//! flat_record! {
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct Pirate {
//!         #[flat("first_name")]
//!         pub first_name: String,
//!         #[flat("age")]
//!         pub age: u32,
//!         #[flat("ship", custom)]
//!         pub ship: Ship,
//!         #[flat("ports", custom_list)]
//!         pub ports: Vec<Port>,
//!         #[flat("-")]
//!         pub internal_id: u64,
//!         pub notes: String,
//!     }
//! }
//!
//! // Generates the struct plus:
//! // impl Record for Pirate {
//! //     fn schema() -> Schema<Self> {
//! //         Schema::<Self>::new()
//! //             .field("first_name", "first_name", |r| &r.first_name, |r| &mut r.first_name)
//! //             .field("age", "age", |r| &r.age, |r| &mut r.age)
//! //             .custom("ship", "ship", |r| &r.ship, |r| &mut r.ship)
//! //             .custom_list("ports", "ports", |r| &r.ports, |r| &mut r.ports)
//! //             .excluded("internal_id")
//! //             .untagged("notes")
//! //     }
//! // }
//! ```
//!
//! A field without `#[flat]` is untagged, which fails construction when
//! `error_if_untagged_field` is set. `#[flat("-")]` excludes a field without
//! requiring its type to be coercible. `custom` fields convert through
//! [`Unmarshal`](crate::Unmarshal) and [`Marshal`](crate::Marshal);
//! `custom_list` applies those item by item to a `Vec`.

/// Declares a record struct with column tags.
#[macro_export]
macro_rules! flat_record {
    (@slot $schema:expr, $field:ident, $ty:ty, []) => {
        $schema.untagged(::core::stringify!($field))
    };
    (@slot $schema:expr, $field:ident, $ty:ty, ["-"]) => {
        $schema.excluded(::core::stringify!($field))
    };
    (@slot $schema:expr, $field:ident, $ty:ty, [$tag:literal, custom]) => {
        $schema.custom::<$ty>(
            ::core::stringify!($field),
            $tag,
            |r| &r.$field,
            |r| &mut r.$field,
        )
    };
    (@slot $schema:expr, $field:ident, $ty:ty, [$tag:literal, custom_list]) => {
        $schema.custom_list(
            ::core::stringify!($field),
            $tag,
            |r| &r.$field,
            |r| &mut r.$field,
        )
    };
    (@slot $schema:expr, $field:ident, $ty:ty, [$tag:literal]) => {
        $schema.field::<$ty>(
            ::core::stringify!($field),
            $tag,
            |r| &r.$field,
            |r| &mut r.$field,
        )
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $(#[flat($($tag:tt)+)])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[doc = $doc])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn schema() -> $crate::Schema<Self> {
                let schema = $crate::Schema::<Self>::new();
                $(
                    let schema = $crate::flat_record!(
                        @slot schema, $field, $ty, [$($($tag)+)?]
                    );
                )*
                schema
            }
        }
    };
}

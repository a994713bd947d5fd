//! Field mapper: the per-type column map built once and reused for every row.
//!
//! A decoder is reconciled against a header row; every header position gets a
//! [`Binding`]. An encoder needs no headers: it emits every tagged field in
//! declaration order.

use crate::coerce;
use crate::error::{Error, FieldError};
use crate::options::Options;
use crate::schema::{FieldSlot, Record, Shape, Tag};
use indexmap::IndexMap;
use tracing::debug;

/// What a header position maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Populates the field at `slot` in the record's schema.
    Field { slot: usize, ident: &'static str },
    /// Repeats the header already bound at `first`; ignored when decoding.
    Duplicate { first: usize },
    /// No field carries this header's name.
    Unmatched,
}

/// Column map between rows and records of type `T`.
pub struct Mapper<T> {
    slots: Vec<FieldSlot<T>>,
    bindings: Vec<Binding>,
    /// Slot indices emitted when encoding, in declaration order.
    active: Vec<usize>,
    options: Options,
}

impl<T: Record> Mapper<T> {
    /// Build a decoder for rows laid out like `headers`.
    pub fn for_decode<S: AsRef<str>>(headers: &[S], options: Options) -> Result<Self, Error> {
        let slots = Self::checked_slots(&options)?;

        let mut positions: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for (index, header) in headers.iter().enumerate() {
            positions.entry(header.as_ref()).or_default().push(index);
        }

        let mut bindings = vec![Binding::Unmatched; headers.len()];
        let mut consumed = vec![false; headers.len()];

        for (slot_index, slot) in slots.iter().enumerate() {
            let Some(column) = slot.column() else {
                continue;
            };
            let indices = positions.get(column).map(Vec::as_slice).unwrap_or(&[]);

            let mut matched: Option<usize> = None;
            for &index in indices {
                if consumed[index] {
                    continue;
                }
                consumed[index] = true;

                match matched {
                    None => {
                        matched = Some(index);
                        bindings[index] = Binding::Field {
                            slot: slot_index,
                            ident: slot.ident(),
                        };
                    }
                    Some(first) if options.error_if_duplicate_headers => {
                        return Err(Error::DuplicateHeader {
                            header: column.to_string(),
                            first,
                            second: index,
                        });
                    }
                    Some(first) => {
                        debug!(header = column, first, index, "ignoring duplicate header");
                        bindings[index] = Binding::Duplicate { first };
                    }
                }
            }

            if matched.is_none() && options.error_if_missing_headers {
                return Err(Error::MissingHeader {
                    header: column.to_string(),
                    field: slot.ident(),
                });
            }
        }

        let active = active_slots(&slots);
        debug!(
            record = std::any::type_name::<T>(),
            columns = headers.len(),
            mapped = bindings
                .iter()
                .filter(|b| matches!(b, Binding::Field { .. }))
                .count(),
            "built decoder"
        );

        Ok(Self {
            slots,
            bindings,
            active,
            options,
        })
    }

    /// Build an encoder.
    ///
    /// Fails when a tagged field's type has no coercion rule.
    pub fn for_encode(options: Options) -> Result<Self, Error> {
        let slots = Self::checked_slots(&options)?;
        let active = active_slots(&slots);

        for &index in &active {
            let slot = &slots[index];
            if let Some(kind) = slot.kind().filter(|kind| !kind.is_supported()) {
                return Err(Error::UnsupportedType {
                    field: slot.ident(),
                    kind: kind.clone(),
                });
            }
        }

        debug!(
            record = std::any::type_name::<T>(),
            columns = active.len(),
            "built encoder"
        );

        Ok(Self {
            slots,
            bindings: Vec::new(),
            active,
            options,
        })
    }

    fn checked_slots(options: &Options) -> Result<Vec<FieldSlot<T>>, Error> {
        let schema = T::schema();
        if schema.shape() == Shape::Nested {
            return Err(Error::NotAnAggregate {
                type_name: schema.type_name(),
            });
        }

        let slots = schema.into_slots();
        if options.error_if_untagged_field {
            if let Some(slot) = slots.iter().find(|s| s.tag() == Tag::Untagged) {
                return Err(Error::UntaggedField { field: slot.ident() });
            }
        }
        Ok(slots)
    }

    /// Decode one data row into a fresh record.
    ///
    /// Cells past the end of a short row, unmatched columns, and duplicate
    /// columns leave their fields at the zero value.
    pub fn unmarshal<S: AsRef<str>>(&self, row: &[S]) -> Result<T, FieldError> {
        let mut record = T::default();

        for (column, (binding, cell)) in self.bindings.iter().zip(row).enumerate() {
            let Binding::Field { slot, ident } = *binding else {
                continue;
            };
            let text = cell.as_ref();
            if text.is_empty() && self.options.ignore_empty_on_decode {
                continue;
            }

            self.slots[slot]
                .decode(&mut record, text)
                .map_err(|source| FieldError {
                    column,
                    field: ident,
                    source,
                })?;
        }

        Ok(record)
    }

    /// Encode one record as a row of column strings.
    ///
    /// Occurrences of `delimiter` inside cells are backslash-escaped.
    pub fn marshal(&self, value: &T, delimiter: u8) -> Result<Vec<String>, FieldError> {
        self.active
            .iter()
            .enumerate()
            .map(|(column, &index)| {
                let slot = &self.slots[index];
                slot.encode(value)
                    .map(|text| coerce::escape_delimiter(text, delimiter))
                    .map_err(|source| FieldError {
                        column,
                        field: slot.ident(),
                        source,
                    })
            })
            .collect()
    }
}

impl<T> Mapper<T> {
    /// Header row emitted by an encoder.
    pub fn headers(&self) -> Vec<String> {
        self.active
            .iter()
            .filter_map(|&index| self.slots[index].column())
            .map(String::from)
            .collect()
    }

    /// Binding of a header position; `None` past the header row or for encoders.
    pub fn binding(&self, column: usize) -> Option<Binding> {
        self.bindings.get(column).copied()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl<T> std::fmt::Debug for Mapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("slots", &self.slots)
            .field("bindings", &self.bindings)
            .field("options", &self.options)
            .finish()
    }
}

fn active_slots<T>(slots: &[FieldSlot<T>]) -> Vec<usize> {
    slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.column().is_some())
        .map(|(index, _)| index)
        .collect()
}

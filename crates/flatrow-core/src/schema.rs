//! Record descriptions: the per-type table of field slots.
//!
//! A [`Record`] describes its fields once through a [`Schema`] builder (or
//! the [`flat_record!`](crate::flat_record) macro). Each slot carries the
//! column tag, the field's [`Kind`], and type-erased accessors that move
//! column text in and out of the field.

use crate::coerce::{self, Marshal, Unmarshal};
use crate::error::CoerceError;
use crate::value::{FieldType, Kind};

type DecodeFn<R> = Box<dyn Fn(&mut R, &str) -> Result<(), CoerceError> + Send + Sync>;
type EncodeFn<R> = Box<dyn Fn(&R) -> Result<String, CoerceError> + Send + Sync>;

/// A fixed-shape aggregate that rows can be decoded into and encoded from.
///
/// Fields not populated by a row keep the value produced by `Default`.
pub trait Record: Default + Send + 'static {
    fn schema() -> Schema<Self>;
}

/// Pointer mode: decoding allocates the record and hands out the box.
impl<R: Record> Record for Box<R> {
    fn schema() -> Schema<Self> {
        R::schema().boxed()
    }
}

/// How a record type is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The record itself.
    Value,
    /// One level of `Box` around the record.
    Pointer,
    /// Anything deeper, which has no mapping.
    Nested,
}

/// Column tag declared on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// No tag at all.
    Untagged,
    /// Tagged `"-"` or `""`; never mapped and never emitted.
    Excluded,
    Column(&'static str),
}

impl Tag {
    /// Normalize a declared tag string.
    pub fn parse(tag: &'static str) -> Self {
        match tag {
            "" | "-" => Tag::Excluded,
            name => Tag::Column(name),
        }
    }

    pub fn column(self) -> Option<&'static str> {
        match self {
            Tag::Column(name) => Some(name),
            _ => None,
        }
    }
}

struct Codec<R> {
    kind: Kind,
    decode: DecodeFn<R>,
    encode: EncodeFn<R>,
}

/// The mapper's descriptor for one record field.
pub struct FieldSlot<R> {
    ident: &'static str,
    tag: Tag,
    codec: Option<Codec<R>>,
}

impl<R> FieldSlot<R> {
    /// Rust field name.
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Column name, if the field takes part in mapping.
    pub fn column(&self) -> Option<&'static str> {
        self.tag.column()
    }

    /// Coercion kind; `None` for fields registered without an accessor.
    pub fn kind(&self) -> Option<&Kind> {
        self.codec.as_ref().map(|c| &c.kind)
    }

    pub(crate) fn decode(&self, record: &mut R, text: &str) -> Result<(), CoerceError> {
        match &self.codec {
            Some(codec) => (codec.decode)(record, text),
            None => Ok(()),
        }
    }

    pub(crate) fn encode(&self, record: &R) -> Result<String, CoerceError> {
        match &self.codec {
            Some(codec) => (codec.encode)(record),
            None => Ok(String::new()),
        }
    }
}

impl<R> std::fmt::Debug for FieldSlot<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSlot")
            .field("ident", &self.ident)
            .field("tag", &self.tag)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Ordered field slots of a record type.
pub struct Schema<R> {
    type_name: &'static str,
    shape: Shape,
    slots: Vec<FieldSlot<R>>,
}

impl<R: Record> Default for Schema<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Schema<R> {
    /// Start an empty schema for `R`.
    pub fn new() -> Self {
        Self {
            type_name: std::any::type_name::<R>(),
            shape: Shape::Value,
            slots: Vec::new(),
        }
    }

    /// Add a field coerced through its [`FieldType`] rule.
    pub fn field<F: FieldType>(
        mut self,
        ident: &'static str,
        tag: &'static str,
        get: fn(&R) -> &F,
        get_mut: fn(&mut R) -> &mut F,
    ) -> Self {
        let kind = F::kind();
        let decode_kind = kind.clone();

        self.slots.push(FieldSlot {
            ident,
            tag: Tag::parse(tag),
            codec: Some(Codec {
                kind,
                decode: Box::new(move |record: &mut R, text: &str| {
                    let value = coerce::decode(&decode_kind, text)?;
                    *get_mut(record) = F::from_value(value)
                        .ok_or_else(|| CoerceError::Unsupported(decode_kind.clone()))?;
                    Ok(())
                }),
                encode: Box::new(move |record: &R| {
                    Ok(coerce::render(&get(record).to_value()))
                }),
            }),
        });
        self
    }

    /// Add a field whose type converts itself through [`Unmarshal`] and [`Marshal`].
    pub fn custom<F>(
        mut self,
        ident: &'static str,
        tag: &'static str,
        get: fn(&R) -> &F,
        get_mut: fn(&mut R) -> &mut F,
    ) -> Self
    where
        F: Unmarshal + Marshal + 'static,
    {
        self.slots.push(FieldSlot {
            ident,
            tag: Tag::parse(tag),
            codec: Some(Codec {
                kind: Kind::Custom,
                decode: Box::new(move |record: &mut R, text: &str| {
                    *get_mut(record) = F::unmarshal(text).map_err(CoerceError::Custom)?;
                    Ok(())
                }),
                encode: Box::new(move |record: &R| {
                    get(record).marshal().map_err(CoerceError::Marshal)
                }),
            }),
        });
        self
    }

    /// Add a `Vec` field whose items convert themselves through [`Unmarshal`]
    /// and [`Marshal`].
    ///
    /// The cell uses the same list form as scalar lists.
    pub fn custom_list<F>(
        mut self,
        ident: &'static str,
        tag: &'static str,
        get: fn(&R) -> &Vec<F>,
        get_mut: fn(&mut R) -> &mut Vec<F>,
    ) -> Self
    where
        F: Unmarshal + Marshal + 'static,
    {
        self.slots.push(FieldSlot {
            ident,
            tag: Tag::parse(tag),
            codec: Some(Codec {
                kind: Kind::List(Box::new(Kind::Custom)),
                decode: Box::new(move |record: &mut R, text: &str| {
                    let items = coerce::list_items(text)
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| {
                            F::unmarshal(item)
                                .map_err(|source| CoerceError::CustomItem { index, source })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    *get_mut(record) = items;
                    Ok(())
                }),
                encode: Box::new(move |record: &R| {
                    let items = get(record)
                        .iter()
                        .map(Marshal::marshal)
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(CoerceError::Marshal)?;
                    Ok(coerce::render_list(&items))
                }),
            }),
        });
        self
    }

    /// Record a field that carries no column tag.
    pub fn untagged(mut self, ident: &'static str) -> Self {
        self.slots.push(FieldSlot {
            ident,
            tag: Tag::Untagged,
            codec: None,
        });
        self
    }

    /// Record a field explicitly excluded from mapping.
    pub fn excluded(mut self, ident: &'static str) -> Self {
        self.slots.push(FieldSlot {
            ident,
            tag: Tag::Excluded,
            codec: None,
        });
        self
    }
}

impl<R: 'static> Schema<R> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn slots(&self) -> &[FieldSlot<R>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn into_slots(self) -> Vec<FieldSlot<R>> {
        self.slots
    }

    /// Lift the slots to operate through a `Box<R>`.
    fn boxed(self) -> Schema<Box<R>> {
        let shape = match self.shape {
            Shape::Value => Shape::Pointer,
            Shape::Pointer | Shape::Nested => Shape::Nested,
        };

        let slots = self
            .slots
            .into_iter()
            .map(|slot| FieldSlot {
                ident: slot.ident,
                tag: slot.tag,
                codec: slot.codec.map(|codec| {
                    let Codec {
                        kind,
                        decode,
                        encode,
                    } = codec;
                    Codec {
                        kind,
                        decode: Box::new(move |record: &mut Box<R>, text: &str| {
                            decode(record.as_mut(), text)
                        }) as DecodeFn<Box<R>>,
                        encode: Box::new(move |record: &Box<R>| encode(record.as_ref()))
                            as EncodeFn<Box<R>>,
                    }
                }),
            })
            .collect();

        Schema {
            type_name: std::any::type_name::<Box<R>>(),
            shape,
            slots,
        }
    }
}

impl<R> std::fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .field("slots", &self.slots)
            .finish()
    }
}

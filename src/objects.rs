//! Output-only objects
//!
//! [`SlotObject`] wraps any `serde::Serialize` struct and projects it onto
//! an element tree without a hand-written [`Projection`]:
//!
//! - the element tag is the serde container name (`#[serde(rename = "...")]`);
//! - booleans, integers, strings, chars and unit enum variants become
//!   attributes, booleans as `true`/`false`;
//! - `None` and unit fields are omitted;
//! - nested structs become child elements named by their own container name;
//! - a sequence of structs becomes a container element named after the
//!   field, holding one child per item.
//!
//! Anything else fails with [`Error::Serialization`]. Fields are visited in
//! declaration order.
//!
//! ```
//! use serde::Serialize;
//! use xmlbind::objects::SlotObject;
//! use xmlbind::Serializable;
//!
//! #[derive(Serialize)]
//! #[serde(rename = "point")]
//! struct Point {
//!     x: i64,
//!     y: i64,
//!     label: Option<String>,
//! }
//!
//! let elem = SlotObject(Point { x: 1, y: 2, label: None }).element_tree().unwrap();
//! assert_eq!(elem.get_attribute("x"), Some("1"));
//! assert_eq!(elem.get_attribute("label"), None);
//! ```
//!
//! [`Projection`]: crate::serialize::Projection

use crate::error::{Error, Result};
use crate::serialize::{boolean_to_str, Serializable};
use crate::tree::Element;
use serde::ser::{self, Impossible, Serialize};
use std::fmt;

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Serialization(msg.to_string())
    }
}

/// A serde-serializable struct exposed as a [`Serializable`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SlotObject<T>(pub T);

impl<T> SlotObject<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> Serializable for SlotObject<T> {
    fn element_tree(&self) -> Result<Element> {
        to_element(&self.0)
    }
}

/// Project a serializable struct onto an element
pub fn to_element<T: Serialize + ?Sized>(value: &T) -> Result<Element> {
    value.serialize(ElementSerializer)
}

fn unsupported(what: &str) -> Error {
    Error::Serialization(format!("cannot project {} onto an element tree", what))
}

/// Serializes a struct as an element
struct ElementSerializer;

/// Collects the fields of one struct
struct StructBuilder {
    elem: Element,
}

impl StructBuilder {
    fn field<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        match value.serialize(FieldSerializer)? {
            FieldValue::Omit => {}
            FieldValue::Attribute(text) => self.elem.set_attribute(key, text),
            FieldValue::Child(child) => self.elem.add_child(child),
            FieldValue::List(items) => {
                let mut container = Element::new(key);
                for item in items {
                    container.add_child(item);
                }
                self.elem.add_child(container);
            }
        }
        Ok(())
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<Element> {
        Ok(self.elem)
    }
}

macro_rules! reject {
    ($($method:ident($($arg:ty),*) => $what:expr;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Self::Ok> {
                Err(unsupported($what))
            }
        )*
    };
}

impl ser::Serializer for ElementSerializer {
    type Ok = Element;
    type Error = Error;
    type SerializeSeq = Impossible<Element, Error>;
    type SerializeTuple = Impossible<Element, Error>;
    type SerializeTupleStruct = Impossible<Element, Error>;
    type SerializeTupleVariant = Impossible<Element, Error>;
    type SerializeMap = Impossible<Element, Error>;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = Impossible<Element, Error>;

    reject! {
        serialize_bool(bool) => "a boolean outside a struct";
        serialize_i8(i8) => "an integer outside a struct";
        serialize_i16(i16) => "an integer outside a struct";
        serialize_i32(i32) => "an integer outside a struct";
        serialize_i64(i64) => "an integer outside a struct";
        serialize_u8(u8) => "an integer outside a struct";
        serialize_u16(u16) => "an integer outside a struct";
        serialize_u32(u32) => "an integer outside a struct";
        serialize_u64(u64) => "an integer outside a struct";
        serialize_f32(f32) => "a float";
        serialize_f64(f64) => "a float";
        serialize_char(char) => "a char outside a struct";
        serialize_str(&str) => "a string outside a struct";
        serialize_bytes(&[u8]) => "bytes";
        serialize_none() => "a missing value";
        serialize_unit() => "a unit value";
        serialize_unit_struct(&'static str) => "a unit struct";
        serialize_unit_variant(&'static str, u32, &'static str) => "an enum variant outside a struct";
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Element> {
        value.serialize(self)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(self, _name: &'static str, value: &T) -> Result<Element> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Element> {
        Err(unsupported("a newtype enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(unsupported("a sequence outside a struct field"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(unsupported("a tuple"))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
        Err(unsupported("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported("a tuple enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported("a map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<StructBuilder> {
        Ok(StructBuilder {
            elem: Element::new(name),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported("a struct enum variant"))
    }
}

/// How one struct field lands in the tree
enum FieldValue {
    Omit,
    Attribute(String),
    Child(Element),
    List(Vec<Element>),
}

/// Serializes one struct field
struct FieldSerializer;

struct NestedStruct(StructBuilder);

impl ser::SerializeStruct for NestedStruct {
    type Ok = FieldValue;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.0.field(key, value)
    }

    fn end(self) -> Result<FieldValue> {
        Ok(FieldValue::Child(self.0.elem))
    }
}

struct ListBuilder {
    items: Vec<Element>,
}

impl ser::SerializeSeq for ListBuilder {
    type Ok = FieldValue;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let item = value.serialize(ElementSerializer).map_err(|err| match err {
            Error::Serialization(message) => {
                Error::Serialization(format!("list items must be structs: {}", message))
            }
            other => other,
        })?;
        self.items.push(item);
        Ok(())
    }

    fn end(self) -> Result<FieldValue> {
        Ok(FieldValue::List(self.items))
    }
}

impl ser::Serializer for FieldSerializer {
    type Ok = FieldValue;
    type Error = Error;
    type SerializeSeq = ListBuilder;
    type SerializeTuple = Impossible<FieldValue, Error>;
    type SerializeTupleStruct = Impossible<FieldValue, Error>;
    type SerializeTupleVariant = Impossible<FieldValue, Error>;
    type SerializeMap = Impossible<FieldValue, Error>;
    type SerializeStruct = NestedStruct;
    type SerializeStructVariant = Impossible<FieldValue, Error>;

    fn serialize_bool(self, v: bool) -> Result<FieldValue> {
        Ok(FieldValue::Attribute(boolean_to_str(v).to_string()))
    }

    fn serialize_i8(self, v: i8) -> Result<FieldValue> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<FieldValue> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<FieldValue> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<FieldValue> {
        Ok(FieldValue::Attribute(v.to_string()))
    }

    fn serialize_u8(self, v: u8) -> Result<FieldValue> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<FieldValue> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<FieldValue> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<FieldValue> {
        Ok(FieldValue::Attribute(v.to_string()))
    }

    fn serialize_f32(self, _v: f32) -> Result<FieldValue> {
        Err(unsupported("a float"))
    }

    fn serialize_f64(self, _v: f64) -> Result<FieldValue> {
        Err(unsupported("a float"))
    }

    fn serialize_char(self, v: char) -> Result<FieldValue> {
        Ok(FieldValue::Attribute(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<FieldValue> {
        Ok(FieldValue::Attribute(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<FieldValue> {
        Err(unsupported("bytes"))
    }

    fn serialize_none(self) -> Result<FieldValue> {
        Ok(FieldValue::Omit)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<FieldValue> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<FieldValue> {
        Ok(FieldValue::Omit)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<FieldValue> {
        Ok(FieldValue::Omit)
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<FieldValue> {
        Ok(FieldValue::Attribute(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(self, _name: &'static str, value: &T) -> Result<FieldValue> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<FieldValue> {
        Err(unsupported("a newtype enum variant"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ListBuilder> {
        Ok(ListBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(unsupported("a tuple"))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
        Err(unsupported("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported("a tuple enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported("a map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<NestedStruct> {
        Ok(NestedStruct(StructBuilder {
            elem: Element::new(name),
        }))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported("a struct enum variant"))
    }
}

//! Classify a serializable value before it is turned into a row.
//!
//! `serde_json` maps `()`, `None` and non-finite floats all to `null`, so
//! voidness has to be decided from the Rust value itself. Only the outermost
//! layer is inspected (through `Some` and newtype wrappers); the contents of
//! sequences, maps and structs are not visited.

use serde::Serialize;
use serde::ser::{self, Serializer};

/// What a value would contribute as a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// `()`, `None` or a unit struct: nothing to emit.
    Void,
    /// A NaN or infinite float, which has no JSON representation.
    NonFinite,
    /// Anything else.
    Present,
}

pub fn presence<T: Serialize + ?Sized>(value: &T) -> Presence {
    // The classifier itself never fails; a custom `Serialize` impl that
    // errors is treated as a row so the error resurfaces during encoding.
    value.serialize(Classifier).unwrap_or(Presence::Present)
}

struct Classifier;

/// Accepts and ignores the contents of compound values.
struct Compound;

type Error = serde_json::Error;

fn float(value: f64) -> Result<Presence, Error> {
    if value.is_finite() {
        Ok(Presence::Present)
    } else {
        Ok(Presence::NonFinite)
    }
}

impl Serializer for Classifier {
    type Ok = Presence;
    type Error = Error;
    type SerializeSeq = Compound;
    type SerializeTuple = Compound;
    type SerializeTupleStruct = Compound;
    type SerializeTupleVariant = Compound;
    type SerializeMap = Compound;
    type SerializeStruct = Compound;
    type SerializeStructVariant = Compound;

    fn serialize_bool(self, _: bool) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_i8(self, _: i8) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_i16(self, _: i16) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_i32(self, _: i32) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_i64(self, _: i64) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_i128(self, _: i128) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_u8(self, _: u8) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_u16(self, _: u16) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_u32(self, _: u32) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_u64(self, _: u64) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_u128(self, _: u128) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_f32(self, value: f32) -> Result<Presence, Error> {
        float(f64::from(value))
    }

    fn serialize_f64(self, value: f64) -> Result<Presence, Error> {
        float(value)
    }

    fn serialize_char(self, _: char) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_str(self, _: &str) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_bytes(self, _: &[u8]) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_none(self) -> Result<Presence, Error> {
        Ok(Presence::Void)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Presence, Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Presence, Error> {
        Ok(Presence::Void)
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Presence, Error> {
        Ok(Presence::Void)
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Presence, Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Compound, Error> {
        Ok(Compound)
    }

    fn serialize_tuple(self, _: usize) -> Result<Compound, Error> {
        Ok(Compound)
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Compound, Error> {
        Ok(Compound)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Compound, Error> {
        Ok(Compound)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Compound, Error> {
        Ok(Compound)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Compound, Error> {
        Ok(Compound)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Compound, Error> {
        Ok(Compound)
    }
}

impl ser::SerializeSeq for Compound {
    type Ok = Presence;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, _: &T) -> Result<(), Error> {
        Ok(())
    }

    fn end(self) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }
}

impl ser::SerializeTuple for Compound {
    type Ok = Presence;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, _: &T) -> Result<(), Error> {
        Ok(())
    }

    fn end(self) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }
}

impl ser::SerializeTupleStruct for Compound {
    type Ok = Presence;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, _: &T) -> Result<(), Error> {
        Ok(())
    }

    fn end(self) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }
}

impl ser::SerializeTupleVariant for Compound {
    type Ok = Presence;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, _: &T) -> Result<(), Error> {
        Ok(())
    }

    fn end(self) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }
}

impl ser::SerializeMap for Compound {
    type Ok = Presence;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, _: &T) -> Result<(), Error> {
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, _: &T) -> Result<(), Error> {
        Ok(())
    }

    fn end(self) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }
}

impl ser::SerializeStruct for Compound {
    type Ok = Presence;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        _: &T,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn end(self) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }
}

impl ser::SerializeStructVariant for Compound {
    type Ok = Presence;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        _: &T,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn end(self) -> Result<Presence, Error> {
        Ok(Presence::Present)
    }
}

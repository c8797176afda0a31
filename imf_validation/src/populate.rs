//! Decodes property values.
//!
//! A property's bytes are decoded according to the [`DecodeKind`] its table
//! entry declares. The declared size must be consumed exactly.

use winnow::{
    Parser as _,
    binary::{be_f32, be_i16, be_i32, be_i64, be_u16, be_u32, be_u64, i8, u8},
    error::EmptyError,
    token::take,
};

use imf_validation_types::{
    primitives::{Rational, Timestamp},
    properties::{Charset, DecodeKind, ElementKind},
    ul::{MxfUid, Ul},
};

use crate::error::PopulateError;

/// A decoded property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Bool(bool),
    F32(f32),
    Rational(Rational),
    Timestamp(Timestamp),
    Ul(Ul),
    Uid(MxfUid),
    String(String),
    Bytes(Vec<u8>),
    StrongRef(MxfUid),
    WeakRef(MxfUid),
    Collection(Vec<Element>),
}

/// One element of a batch or array.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Element {
    U8(u8),
    U16(u16),
    U32(u32),
    I32(i32),
    Ul(Ul),
    /// A UID or strong reference.
    Uid(MxfUid),
    Record(Vec<u8>),
}

/// Decodes `declared_size` bytes from the front of `input` as `kind`.
///
/// On success, exactly `declared_size` bytes were taken from `input`.
///
/// # Errors
///
/// Fails when there aren't enough bytes, when the declared size can't hold
/// this kind of value, when a string isn't valid in its charset, or when a
/// collection's header disagrees with the declared size.
pub fn populate(
    input: &mut &[u8],
    declared_size: u64,
    kind: DecodeKind,
) -> Result<PropertyValue, PopulateError> {
    let available = input.len() as u64;
    let mut value: &[u8] = usize::try_from(declared_size)
        .ok()
        .and_then(|len| take::<_, _, EmptyError>(len).parse_next(input).ok())
        .ok_or_else(|| {
            log::error!("Property needs `{declared_size}` bytes, but only `{available}` remain.");
            PopulateError::NotEnoughData {
                declared: declared_size,
                available,
            }
        })?;

    if let Some(expected) = kind.fixed_size() {
        if expected != declared_size {
            log::error!("`{kind:?}` needs `{expected}` bytes, but `{declared_size}` were declared.");
            return Err(PopulateError::SizeMismatch {
                expected,
                declared: declared_size,
            });
        }
    }

    let decoded = decode(&mut value, declared_size, kind)?;

    // every declared byte must be used
    if !value.is_empty() {
        let consumed = declared_size - value.len() as u64;
        log::error!("Decoded `{kind:?}` with `{consumed}` of `{declared_size}` bytes.");
        return Err(PopulateError::UnderRead {
            declared: declared_size,
            consumed,
        });
    }

    log::trace!("Decoded `{kind:?}`: {decoded:?}");
    Ok(decoded)
}

/// Maps running out of bytes inside a value.
fn short(declared: u64) -> impl Fn(EmptyError) -> PopulateError {
    move |_| PopulateError::NotEnoughData {
        declared,
        available: 0,
    }
}

fn take_array<const N: usize>(input: &mut &[u8], declared: u64) -> Result<[u8; N], PopulateError> {
    take(N)
        .parse_next(input)
        .map_err(short(declared))
        .and_then(|s: &[u8]| <[u8; N]>::try_from(s).map_err(|_| short(declared)(EmptyError)))
}

fn decode(input: &mut &[u8], declared: u64, kind: DecodeKind) -> Result<PropertyValue, PopulateError> {
    let err = short(declared);

    Ok(match kind {
        DecodeKind::U8 => PropertyValue::U8(u8.parse_next(input).map_err(&err)?),
        DecodeKind::U16 => PropertyValue::U16(be_u16.parse_next(input).map_err(&err)?),
        DecodeKind::U32 => PropertyValue::U32(be_u32.parse_next(input).map_err(&err)?),
        DecodeKind::U64 => PropertyValue::U64(be_u64.parse_next(input).map_err(&err)?),
        DecodeKind::I8 => PropertyValue::I8(i8.parse_next(input).map_err(&err)?),
        DecodeKind::I16 => PropertyValue::I16(be_i16.parse_next(input).map_err(&err)?),
        DecodeKind::I32 => PropertyValue::I32(be_i32.parse_next(input).map_err(&err)?),
        DecodeKind::I64 => PropertyValue::I64(be_i64.parse_next(input).map_err(&err)?),
        DecodeKind::Bool => PropertyValue::Bool(u8.parse_next(input).map_err(&err)? != 0),
        DecodeKind::F32 => PropertyValue::F32(be_f32.parse_next(input).map_err(&err)?),

        DecodeKind::Rational => {
            let numerator: i32 = be_i32.parse_next(input).map_err(&err)?;
            let denominator: i32 = be_i32.parse_next(input).map_err(&err)?;
            PropertyValue::Rational(Rational::new(numerator, denominator))
        }

        DecodeKind::Timestamp => {
            PropertyValue::Timestamp(Timestamp::from_bytes(take_array::<8>(input, declared)?))
        }

        DecodeKind::Ul => PropertyValue::Ul(Ul::new(take_array::<16>(input, declared)?)),
        DecodeKind::Uid => PropertyValue::Uid(MxfUid::Uid(take_array::<16>(input, declared)?)),
        DecodeKind::Umid => PropertyValue::Uid(MxfUid::Umid(take_array::<32>(input, declared)?)),
        DecodeKind::StrongRef => {
            PropertyValue::StrongRef(MxfUid::Uid(take_array::<16>(input, declared)?))
        }
        DecodeKind::WeakRef => {
            PropertyValue::WeakRef(MxfUid::Uid(take_array::<16>(input, declared)?))
        }

        DecodeKind::String(charset) => {
            let bytes: &[u8] = take(input.len()).parse_next(input).map_err(&err)?;
            PropertyValue::String(decode_string(bytes, charset)?)
        }

        DecodeKind::Bytes => {
            let bytes: &[u8] = take(input.len()).parse_next(input).map_err(&err)?;
            PropertyValue::Bytes(bytes.to_vec())
        }

        DecodeKind::Batch(element) | DecodeKind::Array(element) => {
            PropertyValue::Collection(decode_collection(input, declared, element)?)
        }
    })
}

/// Decodes a string, dropping any trailing NUL characters.
fn decode_string(bytes: &[u8], charset: Charset) -> Result<String, PopulateError> {
    let invalid = || {
        log::error!("String bytes aren't valid `{charset:?}`.");
        PopulateError::InvalidString(charset)
    };

    let s = match charset {
        Charset::Utf16Be => {
            if bytes.len() % 2 != 0 {
                return Err(invalid());
            }
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map_err(|_| invalid())?
        }
        Charset::Utf8 => core::str::from_utf8(bytes)
            .map_err(|_| invalid())?
            .to_string(),
        Charset::Ascii => {
            if !bytes.is_ascii() {
                return Err(invalid());
            }
            core::str::from_utf8(bytes)
                .map_err(|_| invalid())?
                .to_string()
        }
    };

    Ok(s.trim_end_matches('\0').to_string())
}

/// Decodes a batch or array: a `u32` count, a `u32` element size, then the
/// elements.
fn decode_collection(
    input: &mut &[u8],
    declared: u64,
    element: ElementKind,
) -> Result<Vec<Element>, PopulateError> {
    let err = short(declared);
    let count: u32 = be_u32.parse_next(input).map_err(&err)?;
    let element_size: u32 = be_u32.parse_next(input).map_err(&err)?;

    if let ElementKind::Record(0) = element {
        log::error!("Zero-sized records can't be decoded.");
        return Err(PopulateError::UnsupportedElement(element));
    }

    // empty collections sometimes carry a zero element size
    if count > 0 && element_size != element.size_bytes() {
        log::error!(
            "Collection of `{element:?}` claims elements of `{element_size}` bytes."
        );
        return Err(PopulateError::UnexpectedElementSize {
            kind: element,
            found: element_size,
        });
    }

    if 8 + count as u64 * element_size as u64 != declared {
        log::error!(
            "Collection header says `{count}` x `{element_size}` bytes, but `{declared}` were declared."
        );
        return Err(PopulateError::CollectionHeaderMismatch {
            count,
            element_size,
            declared,
        });
    }

    (0..count)
        .map(|_| {
            Ok(match element {
                ElementKind::U8 => Element::U8(u8.parse_next(input).map_err(&err)?),
                ElementKind::U16 => Element::U16(be_u16.parse_next(input).map_err(&err)?),
                ElementKind::U32 => Element::U32(be_u32.parse_next(input).map_err(&err)?),
                ElementKind::I32 => Element::I32(be_i32.parse_next(input).map_err(&err)?),
                ElementKind::Ul => Element::Ul(Ul::new(take_array::<16>(input, declared)?)),
                ElementKind::StrongRef | ElementKind::Uid => {
                    Element::Uid(MxfUid::Uid(take_array::<16>(input, declared)?))
                }
                ElementKind::Record(size) => {
                    let bytes: &[u8] = take(size as usize).parse_next(input).map_err(&err)?;
                    Element::Record(bytes.to_vec())
                }
            })
        })
        .collect()
}

impl PropertyValue {
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            PropertyValue::U8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            PropertyValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            PropertyValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            PropertyValue::I8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<Rational> {
        match self {
            PropertyValue::Rational(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            PropertyValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_ul(&self) -> Option<Ul> {
        match self {
            PropertyValue::Ul(v) => Some(*v),
            _ => None,
        }
    }

    /// Any kind of identifier, including references.
    pub fn as_uid(&self) -> Option<MxfUid> {
        match self {
            PropertyValue::Uid(v) | PropertyValue::StrongRef(v) | PropertyValue::WeakRef(v) => {
                Some(*v)
            }
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Element]> {
        match self {
            PropertyValue::Collection(v) => Some(v),
            _ => None,
        }
    }

    /// The ULs in a collection of ULs.
    pub fn as_uls(&self) -> Option<Vec<Ul>> {
        self.as_collection()?
            .iter()
            .map(|e| match e {
                Element::Ul(ul) => Some(*ul),
                _ => None,
            })
            .collect()
    }

    /// The identifiers in a collection of UIDs or strong references.
    pub fn as_uids(&self) -> Option<Vec<MxfUid>> {
        self.as_collection()?
            .iter()
            .map(|e| match e {
                Element::Uid(uid) => Some(*uid),
                _ => None,
            })
            .collect()
    }

    /// The records in a collection of fixed-size records.
    pub fn as_records(&self) -> Option<Vec<&[u8]>> {
        self.as_collection()?
            .iter()
            .map(|e| match e {
                Element::Record(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// The numbers in a collection of `i32`s.
    pub fn as_i32s(&self) -> Option<Vec<i32>> {
        self.as_collection()?
            .iter()
            .map(|e| match e {
                Element::I32(v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

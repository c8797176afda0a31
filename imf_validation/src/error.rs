//! Errors from reading MXF bytes.
//!
//! These are "this file is corrupt" errors. They stop parsing right away, as
//! every later offset depends on the bytes that failed. Compliance problems
//! go into an [`ErrorLog`] instead, and surface as [`ValidationFailure`].

use std::sync::Arc;

use imf_validation_types::{
    properties::{Charset, ElementKind, PropertyId},
    sets::SetKind,
    ul::{MxfUid, Ul},
};

use crate::error_log::{ErrorLevel, ErrorLog};

/// A problem with a KLV packet's key or length field.
#[derive(Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum KlvError {
    /// The stream ended inside the key or length field.
    NotEnoughData,

    /// The first length byte was `0x80` or `0xFF`, which are reserved.
    ReservedLengthByte(u8),

    /// The length field said it had more than 8 suffix bytes.
    LengthFieldTooLong(
        /// How many suffix bytes it claimed.
        u8,
    ),

    /// The length doesn't fit in a signed 64-bit integer.
    LengthOverflow(u64),
}

impl core::fmt::Display for KlvError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KlvError::NotEnoughData => f.write_str("Not enough data for a KLV key and length."),
            KlvError::ReservedLengthByte(b) => {
                write!(f, "The length field starts with reserved byte `0x{b:02x}`.")
            }
            KlvError::LengthFieldTooLong(n) => write!(
                f,
                "The length field claims `{n}` suffix bytes, but at most 8 are allowed."
            ),
            KlvError::LengthOverflow(len) => {
                write!(f, "The length `{len}` is larger than the largest signed 64-bit value.")
            }
        }
    }
}

impl core::error::Error for KlvError {}

/// A problem decoding one property's value.
#[derive(Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum PopulateError {
    /// The declared size doesn't match the size this kind of value has.
    SizeMismatch { expected: u64, declared: u64 },

    /// The stream ended before the declared size was reached.
    NotEnoughData { declared: u64, available: u64 },

    /// Decoding finished without consuming every declared byte.
    UnderRead { declared: u64, consumed: u64 },

    /// The bytes weren't valid in the declared charset.
    InvalidString(Charset),

    /// A collection's header disagrees with its declared size.
    CollectionHeaderMismatch {
        count: u32,
        element_size: u32,
        declared: u64,
    },

    /// A collection's element size doesn't fit its element kind.
    UnexpectedElementSize { kind: ElementKind, found: u32 },

    /// This element kind isn't supported in this kind of collection.
    UnsupportedElement(ElementKind),
}

impl core::fmt::Display for PopulateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PopulateError::SizeMismatch { expected, declared } => write!(
                f,
                "Declared size `{declared}` doesn't match the expected size `{expected}`."
            ),
            PopulateError::NotEnoughData {
                declared,
                available,
            } => write!(
                f,
                "Declared size is `{declared}` bytes, but only `{available}` are left."
            ),
            PopulateError::UnderRead { declared, consumed } => write!(
                f,
                "Only `{consumed}` of `{declared}` declared bytes were consumed."
            ),
            PopulateError::InvalidString(cs) => write!(f, "String isn't valid `{cs:?}`."),
            PopulateError::CollectionHeaderMismatch {
                count,
                element_size,
                declared,
            } => write!(
                f,
                "Collection of `{count}` elements of `{element_size}` bytes doesn't fit \
                    in `{declared}` declared bytes."
            ),
            PopulateError::UnexpectedElementSize { kind, found } => write!(
                f,
                "Collection elements of kind `{kind:?}` can't be `{found}` bytes long."
            ),
            PopulateError::UnsupportedElement(kind) => {
                write!(f, "Collection element kind `{kind:?}` is unsupported here.")
            }
        }
    }
}

impl core::error::Error for PopulateError {}

/// An error from reading partitions or the header metadata.
#[derive(Clone, Debug)]
pub enum MxfError {
    /// The byte provider failed.
    Io(
        // note: `Arc` allows us to impl `Clone`
        Arc<std::io::Error>,
    ),

    /// A KLV packet header couldn't be decoded.
    Klv {
        /// Where the packet starts in the resource.
        offset: u64,
        error: KlvError,
    },

    /// A property in a metadata set couldn't be decoded.
    Populate {
        set: SetKind,
        property: PropertyId,
        error: PopulateError,
    },

    /// A KLV packet's value runs past the end of its partition or resource.
    PacketOverrun { offset: u64, length: u64 },

    /// Expected a partition pack, but found some other key.
    NotAPartitionPack { offset: u64, key: Ul },

    /// The partition pack's value is too short or its batch is inconsistent.
    MalformedPartitionPack { offset: u64 },

    /// The header metadata didn't start with a primer pack.
    MissingPrimerPack,

    /// The primer pack's batch header is inconsistent.
    MalformedPrimerPack,

    /// A local set's items ran past the end of the set.
    MalformedLocalSet { offset: u64 },

    MissingPreface,
    DuplicatePreface,

    /// A set had no instance UID.
    MissingInstanceUid(SetKind),

    /// Two sets shared an instance UID.
    DuplicateInstanceUid(MxfUid),

    /// A required strong reference pointed at nothing (or at the wrong kind
    /// of set).
    UnresolvedReference {
        from: SetKind,
        property: PropertyId,
        target: MxfUid,
    },

    /// A required property was missing from a set.
    MissingProperty { set: SetKind, property: PropertyId },

    /// The random index pack is missing or malformed.
    RandomIndexPack(&'static str),

    /// A read was outside the resource.
    OutOfRange { start: u64, end: u64, size: u64 },
}

impl core::fmt::Display for MxfError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MxfError::Io(e) => write!(f, "Failed to read from the resource. err: {e}"),
            MxfError::Klv { offset, error } => {
                write!(f, "Bad KLV packet at offset `{offset}`. err: {error}")
            }
            MxfError::Populate {
                set,
                property,
                error,
            } => write!(
                f,
                "Couldn't decode `{}` in a `{}` set. err: {error}",
                property.name(),
                set.name()
            ),
            MxfError::PacketOverrun { offset, length } => write!(
                f,
                "KLV packet at offset `{offset}` claims `{length}` bytes, which runs past \
                    the end of the data."
            ),
            MxfError::NotAPartitionPack { offset, key } => {
                write!(f, "Expected a partition pack at offset `{offset}`, found `{key}`.")
            }
            MxfError::MalformedPartitionPack { offset } => {
                write!(f, "The partition pack at offset `{offset}` is malformed.")
            }
            MxfError::MissingPrimerPack => {
                f.write_str("The header metadata doesn't start with a primer pack.")
            }
            MxfError::MalformedPrimerPack => f.write_str("The primer pack is malformed."),
            MxfError::MalformedLocalSet { offset } => {
                write!(f, "The local set at offset `{offset}` is malformed.")
            }
            MxfError::MissingPreface => f.write_str("The header partition has no Preface."),
            MxfError::DuplicatePreface => {
                f.write_str("The header partition has more than one Preface.")
            }
            MxfError::MissingInstanceUid(set) => {
                write!(f, "A `{}` set has no instance UID.", set.name())
            }
            MxfError::DuplicateInstanceUid(uid) => {
                write!(f, "More than one set has the instance UID `{uid}`.")
            }
            MxfError::UnresolvedReference {
                from,
                property,
                target,
            } => write!(
                f,
                "`{}.{}` refers to `{target}`, which isn't a compatible set in this partition.",
                from.name(),
                property.name()
            ),
            MxfError::MissingProperty { set, property } => write!(
                f,
                "A `{}` set is missing its required `{}` property.",
                set.name(),
                property.name()
            ),
            MxfError::RandomIndexPack(reason) => {
                write!(f, "The random index pack is unusable: {reason}")
            }
            MxfError::OutOfRange { start, end, size } => write!(
                f,
                "Range `{start}..={end}` is outside the resource of `{size}` bytes."
            ),
        }
    }
}

impl core::error::Error for MxfError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            MxfError::Io(e) => Some(e.as_ref()),
            MxfError::Klv { error, .. } => Some(error),
            MxfError::Populate { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MxfError {
    fn from(value: std::io::Error) -> Self {
        MxfError::Io(value.into())
    }
}

/// A batch of compliance checks found FATAL errors.
///
/// This carries the whole ledger, including WARNING and NON_FATAL entries, so
/// callers see every problem and not just the first one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationFailure {
    log: ErrorLog,
}

impl ValidationFailure {
    pub fn new(log: ErrorLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    pub fn into_log(self) -> ErrorLog {
        self.log
    }

    /// Fails if any FATAL entry was logged at or after index `batch_start`.
    ///
    /// Checkers note `log.len()` before their first check, run every check,
    /// then call this.
    pub fn check_batch(log: &ErrorLog, batch_start: usize) -> Result<(), ValidationFailure> {
        if log.has_fatal_errors_in(batch_start..log.len()) {
            Err(ValidationFailure::new(log.clone()))
        } else {
            Ok(())
        }
    }
}

impl core::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let fatal = self.log.errors_by_level(ErrorLevel::Fatal, None).len();
        writeln!(
            f,
            "Validation failed with `{fatal}` fatal error(s) out of `{}`:",
            self.log.len()
        )?;
        write!(f, "{}", self.log)
    }
}

impl core::error::Error for ValidationFailure {}

/// A problem decoding JPEG 2000 header parameters.
#[derive(Clone, Debug)]
pub enum J2kError {
    /// `xmltree` failed to parse the descriptor XML.
    XmlParseError(
        // note: `Arc` allows us to impl `Clone`
        Arc<xmltree::ParseError>,
    ),

    /// A required element is missing from the descriptor node.
    MissingElement(&'static str),

    /// An element's text isn't a number.
    InvalidNumber { element: &'static str, text: String },

    /// An element's text isn't hex.
    InvalidHex { element: &'static str },

    /// The coding style default marker is too short.
    TruncatedCodingStyle,

    /// The quantization default marker is too short.
    TruncatedQuantization,

    /// The extended capabilities record is too short or inconsistent.
    MalformedCapabilities,

    /// `Csiz` disagrees with the number of component sizing records.
    ComponentCountMismatch { csiz: u16, records: usize },
}

impl core::fmt::Display for J2kError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            J2kError::XmlParseError(e) => {
                write!(f, "Encountered error while parsing XML. err: {e}")
            }
            J2kError::MissingElement(name) => {
                write!(f, "The J2K descriptor is missing `{name}`.")
            }
            J2kError::InvalidNumber { element, text } => {
                write!(f, "`{element}` should be a number, but was `{text}`.")
            }
            J2kError::InvalidHex { element } => write!(f, "`{element}` should be hex."),
            J2kError::TruncatedCodingStyle => f.write_str("The coding style default is too short."),
            J2kError::TruncatedQuantization => {
                f.write_str("The quantization default is too short.")
            }
            J2kError::MalformedCapabilities => {
                f.write_str("The extended capabilities record is malformed.")
            }
            J2kError::ComponentCountMismatch { csiz, records } => write!(
                f,
                "`Csiz` is `{csiz}`, but there are `{records}` component sizing records."
            ),
        }
    }
}

impl core::error::Error for J2kError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            J2kError::XmlParseError(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<xmltree::ParseError> for J2kError {
    fn from(value: xmltree::ParseError) -> Self {
        J2kError::XmlParseError(value.into())
    }
}

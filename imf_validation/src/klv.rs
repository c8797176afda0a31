//! KLV packets.
//!
//! Every structure in an MXF file is a Key-Length-Value packet: a 16-byte UL
//! key, a BER length, then that many bytes of value.

use winnow::{Parser as _, binary::u8, error::EmptyError, token::take};

use imf_validation_types::{labels, ul::Ul};

use crate::{
    error::{KlvError, MxfError},
    provider::{ResourceByteRangeProvider, read_len},
};

/// The longest a key + length can be: 16 key bytes, 1 length byte, and up
/// to 8 suffix bytes.
pub const MAX_KL_SIZE: u64 = 16 + 1 + 8;

/// A decoded packet header.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct KlvHeader {
    pub key: Ul,

    /// How many bytes the value takes.
    pub length: u64,

    /// How many bytes the length field took, from 1 to 9.
    pub length_field_size: u8,

    /// Where this packet starts in the resource.
    pub byte_offset: u64,
}

impl KlvHeader {
    /// Parses a header at the front of `input`.
    ///
    /// `byte_offset` is where `input` starts in the resource. On success, the
    /// input is left at the start of the value.
    pub fn parse(input: &mut &[u8], byte_offset: u64) -> Result<KlvHeader, KlvError> {
        let key: &[u8] = take(16_usize)
            .parse_next(input)
            .map_err(|_: EmptyError| KlvError::NotEnoughData)?;
        let key = Ul::from_slice(key).ok_or(KlvError::NotEnoughData)?;

        let (length, length_field_size) = read_length(input)?;

        log::trace!("KLV at `{byte_offset}`: key `{key}`, length `{length}`.");
        Ok(KlvHeader {
            key,
            length,
            length_field_size,
            byte_offset,
        })
    }

    /// Reads a header from the provider at `offset`.
    pub fn read(
        provider: &(impl ResourceByteRangeProvider + ?Sized),
        offset: u64,
    ) -> Result<KlvHeader, MxfError> {
        let available = provider.size().saturating_sub(offset);
        let bytes = read_len(provider, offset, MAX_KL_SIZE.min(available))?;

        KlvHeader::parse(&mut bytes.as_slice(), offset).map_err(|error| {
            log::error!("Failed to read KLV header at `{offset}`. err: {error}");
            MxfError::Klv { offset, error }
        })
    }

    /// The size of the key plus the length field.
    pub const fn kl_size(&self) -> u64 {
        16 + self.length_field_size as u64
    }

    /// The size of the whole packet.
    pub const fn total_size(&self) -> u64 {
        self.kl_size() + self.length
    }

    /// Where the value starts in the resource.
    pub const fn value_offset(&self) -> u64 {
        self.byte_offset + self.kl_size()
    }

    pub fn is_fill_item(&self) -> bool {
        labels::is_fill_item(&self.key)
    }

    pub fn is_partition_pack(&self) -> bool {
        labels::is_partition_pack(&self.key)
    }

    pub fn is_primer_pack(&self) -> bool {
        self.key.equals_ignoring_version(&labels::PRIMER_PACK)
    }

    pub fn is_random_index_pack(&self) -> bool {
        self.key.equals_ignoring_version(&labels::RANDOM_INDEX_PACK)
    }

    pub fn is_index_table_segment(&self) -> bool {
        self.key.equals_ignoring_version(&labels::INDEX_TABLE_SEGMENT)
    }

    pub fn is_phdr_metadata(&self) -> bool {
        self.key.equals_ignoring_version(&labels::PHDR_METADATA_PAYLOAD)
    }

    pub fn is_generic_stream_data(&self) -> bool {
        self.key
            .equals_ignoring_version(&labels::GENERIC_STREAM_DATA_ELEMENT)
    }
}

/// Decodes a BER length field.
///
/// Returns the length and how many bytes the field took.
///
/// - if the first byte's top bit is clear, it's the length
/// - otherwise, its low 7 bits say how many big-endian bytes follow
///
/// `0x80` and `0xFF` are reserved, more than 8 suffix bytes is refused, and
/// so is anything larger than `i64::MAX`.
pub fn read_length(input: &mut &[u8]) -> Result<(u64, u8), KlvError> {
    let first: u8 = u8
        .parse_next(input)
        .map_err(|_: EmptyError| KlvError::NotEnoughData)?;

    if first & 0x80 == 0 {
        return Ok((first as u64, 1));
    }

    if first == 0x80 || first == 0xFF {
        log::error!("Length field starts with reserved byte `0x{first:02x}`.");
        return Err(KlvError::ReservedLengthByte(first));
    }

    let suffix_len = first & 0x7F;
    if suffix_len > 8 {
        log::error!("Length field claims `{suffix_len}` suffix bytes.");
        return Err(KlvError::LengthFieldTooLong(suffix_len));
    }

    let suffix: &[u8] = take(suffix_len as usize)
        .parse_next(input)
        .map_err(|_: EmptyError| KlvError::NotEnoughData)?;

    let length = suffix
        .iter()
        .fold(0_u64, |acc, b| (acc << 8) | *b as u64);

    if length > i64::MAX as u64 {
        log::error!("Length `{length}` overflows a signed 64-bit value.");
        return Err(KlvError::LengthOverflow(length));
    }

    Ok((length, 1 + suffix_len))
}

/// A packet whose value is already in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KlvPacket<'input> {
    pub header: KlvHeader,
    pub value: &'input [u8],
}

impl<'input> KlvPacket<'input> {
    /// Takes the next whole packet out of `input`.
    ///
    /// `byte_offset` is where `input` starts in the resource.
    pub fn parse(input: &mut &'input [u8], byte_offset: u64) -> Result<Self, MxfError> {
        let header = KlvHeader::parse(input, byte_offset).map_err(|error| {
            log::error!("Failed to read KLV header at `{byte_offset}`. err: {error}");
            MxfError::Klv {
                offset: byte_offset,
                error,
            }
        })?;

        let value: &[u8] = usize::try_from(header.length)
            .ok()
            .and_then(|len| take::<_, _, EmptyError>(len).parse_next(input).ok())
            .ok_or_else(|| {
                log::error!(
                    "KLV value at `{byte_offset}` needs `{}` bytes, but only `{}` remain.",
                    header.length,
                    input.len()
                );
                MxfError::PacketOverrun {
                    offset: byte_offset,
                    length: header.length,
                }
            })?;

        Ok(KlvPacket { header, value })
    }
}

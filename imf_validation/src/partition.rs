//! Partition packs and the random index pack.
//!
//! An MXF file is split into partitions. Each one starts with a partition
//! pack saying what it holds: header metadata, index table segments, or
//! essence. The random index pack at the very end of the file lists where
//! every partition starts, so we never have to scan the whole file to find
//! them.

use winnow::{
    Parser as _,
    binary::{be_u16, be_u32, be_u64},
    error::EmptyError,
    token::take,
};

use imf_validation_types::ul::Ul;

use crate::{
    error::MxfError,
    error_log::{ErrorCode, ErrorLevel, ErrorLog},
    klv::{KlvHeader, KlvPacket},
    provider::{ResourceByteRangeProvider, read_len},
};

/// The fixed part of a partition pack's value, before the essence container
/// batch's entries.
pub const PARTITION_PACK_MIN_SIZE: u64 = 88;

/// Each random index pack entry is a 4-byte body SID and an 8-byte offset.
const RIP_ENTRY_SIZE: usize = 12;

/// Where a partition sits in the file.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum PartitionKind {
    Header,
    Body,
    Footer,
}

impl PartitionKind {
    fn from_key_byte(b: u8) -> Option<Self> {
        match b {
            0x02 => Some(PartitionKind::Header),
            0x03 => Some(PartitionKind::Body),
            0x04 => Some(PartitionKind::Footer),
            _ => None,
        }
    }
}

/// Whether a partition is open or closed, and complete or incomplete.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum PartitionStatus {
    OpenIncomplete,
    ClosedIncomplete,
    OpenComplete,
    ClosedComplete,

    /// A status byte we don't recognize.
    Unknown(u8),
}

impl PartitionStatus {
    fn from_key_byte(b: u8) -> Self {
        match b {
            0x01 => PartitionStatus::OpenIncomplete,
            0x02 => PartitionStatus::ClosedIncomplete,
            0x03 => PartitionStatus::OpenComplete,
            0x04 => PartitionStatus::ClosedComplete,
            other => PartitionStatus::Unknown(other),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            PartitionStatus::ClosedIncomplete | PartitionStatus::ClosedComplete
        )
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            PartitionStatus::OpenComplete | PartitionStatus::ClosedComplete
        )
    }
}

/// A decoded partition pack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionPack {
    pub kind: PartitionKind,
    pub status: PartitionStatus,
    pub major_version: u16,
    pub minor_version: u16,
    pub kag_size: u32,
    pub this_partition: u64,
    pub previous_partition: u64,
    pub footer_partition: u64,
    pub header_byte_count: u64,
    pub index_byte_count: u64,
    pub index_sid: u32,
    pub body_offset: u64,
    pub body_sid: u32,
    pub operational_pattern: Ul,
    pub essence_containers: Vec<Ul>,

    /// Where the pack's KLV packet starts in the resource.
    pub byte_offset: u64,

    /// The size of the pack's whole KLV packet.
    pub packet_size: u64,
}

impl PartitionPack {
    /// Reads the partition pack at `offset`.
    pub fn read(
        provider: &(impl ResourceByteRangeProvider + ?Sized),
        offset: u64,
    ) -> Result<PartitionPack, MxfError> {
        let header = KlvHeader::read(provider, offset)?;
        if !header.is_partition_pack() {
            log::error!("Expected a partition pack at `{offset}`, but found `{}`.", header.key);
            return Err(MxfError::NotAPartitionPack {
                offset,
                key: header.key,
            });
        }

        let value = read_len(provider, header.value_offset(), header.length)?;
        PartitionPack::from_value(&header, &value)
    }

    /// Decodes a partition pack that's already in memory.
    pub fn from_packet(packet: &KlvPacket<'_>) -> Result<PartitionPack, MxfError> {
        if !packet.header.is_partition_pack() {
            return Err(MxfError::NotAPartitionPack {
                offset: packet.header.byte_offset,
                key: packet.header.key,
            });
        }

        PartitionPack::from_value(&packet.header, packet.value)
    }

    fn from_value(header: &KlvHeader, mut value: &[u8]) -> Result<PartitionPack, MxfError> {
        let offset = header.byte_offset;
        let malformed = |_: EmptyError| {
            log::error!("Partition pack at `{offset}` is truncated.");
            MxfError::MalformedPartitionPack { offset }
        };

        if (value.len() as u64) < PARTITION_PACK_MIN_SIZE {
            log::error!(
                "Partition pack at `{offset}` has `{}` bytes, but needs at least `{PARTITION_PACK_MIN_SIZE}`.",
                value.len()
            );
            return Err(MxfError::MalformedPartitionPack { offset });
        }

        let kind = PartitionKind::from_key_byte(header.key.0[13])
            .ok_or(MxfError::MalformedPartitionPack { offset })?;
        let status = PartitionStatus::from_key_byte(header.key.0[14]);

        let input = &mut value;
        let major_version = be_u16.parse_next(input).map_err(malformed)?;
        let minor_version = be_u16.parse_next(input).map_err(malformed)?;
        let kag_size = be_u32.parse_next(input).map_err(malformed)?;
        let this_partition = be_u64.parse_next(input).map_err(malformed)?;
        let previous_partition = be_u64.parse_next(input).map_err(malformed)?;
        let footer_partition = be_u64.parse_next(input).map_err(malformed)?;
        let header_byte_count = be_u64.parse_next(input).map_err(malformed)?;
        let index_byte_count = be_u64.parse_next(input).map_err(malformed)?;
        let index_sid = be_u32.parse_next(input).map_err(malformed)?;
        let body_offset = be_u64.parse_next(input).map_err(malformed)?;
        let body_sid = be_u32.parse_next(input).map_err(malformed)?;
        let operational_pattern: &[u8] = take(16_usize).parse_next(input).map_err(malformed)?;
        let operational_pattern = Ul::from_slice(operational_pattern)
            .ok_or(MxfError::MalformedPartitionPack { offset })?;

        let count = be_u32.parse_next(input).map_err(malformed)?;
        let size = be_u32.parse_next(input).map_err(malformed)?;
        if (count > 0 && size != 16) || count as u64 * 16 != input.len() as u64 {
            log::error!(
                "Partition pack at `{offset}` lists `{count}` essence containers of `{size}` bytes in `{}` bytes.",
                input.len()
            );
            return Err(MxfError::MalformedPartitionPack { offset });
        }

        let mut essence_containers = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let ul: &[u8] = take(16_usize).parse_next(input).map_err(malformed)?;
            essence_containers.push(Ul::from_slice(ul).ok_or(MxfError::MalformedPartitionPack { offset })?);
        }

        if this_partition != offset {
            log::warn!("Partition pack at `{offset}` says it's at `{this_partition}`.");
        }

        log::debug!(
            "Read {kind:?} partition at `{offset}`: header bytes `{header_byte_count}`, index bytes `{index_byte_count}`, body SID `{body_sid}`."
        );

        Ok(PartitionPack {
            kind,
            status,
            major_version,
            minor_version,
            kag_size,
            this_partition,
            previous_partition,
            footer_partition,
            header_byte_count,
            index_byte_count,
            index_sid,
            body_offset,
            body_sid,
            operational_pattern,
            essence_containers,
            byte_offset: offset,
            packet_size: header.total_size(),
        })
    }

    pub fn has_header_metadata(&self) -> bool {
        self.header_byte_count > 0
    }

    pub fn has_index_table_segments(&self) -> bool {
        self.index_byte_count > 0
    }

    pub fn has_essence_container(&self) -> bool {
        self.body_sid > 0
    }

    pub fn essence_container_count(&self) -> usize {
        self.essence_containers.len()
    }

    /// How many of the three kinds of content this partition claims.
    pub fn content_kinds(&self) -> usize {
        [
            self.has_header_metadata(),
            self.has_index_table_segments(),
            self.has_essence_container(),
        ]
        .into_iter()
        .filter(|b| *b)
        .count()
    }
}

/// One random index pack entry.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct RipEntry {
    pub body_sid: u32,
    pub byte_offset: u64,
}

/// The random index pack at the end of a file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomIndexPack {
    pub entries: Vec<RipEntry>,

    /// The size of the whole pack, as its last 4 bytes say.
    pub size: u32,
}

impl RandomIndexPack {
    /// Reads the random index pack from the end of the resource.
    pub fn read(
        provider: &(impl ResourceByteRangeProvider + ?Sized),
    ) -> Result<RandomIndexPack, MxfError> {
        let file_size = provider.size();
        if file_size < 4 {
            log::error!("Resource is only `{file_size}` bytes, too small for a random index pack.");
            return Err(MxfError::RandomIndexPack("resource is too small"));
        }

        let trailer = read_len(provider, file_size - 4, 4)?;
        let size = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if size as u64 > file_size || (size as usize) < 16 + 1 + 4 {
            log::error!("Random index pack claims `{size}` bytes in a `{file_size}` byte resource.");
            return Err(MxfError::RandomIndexPack("trailing size is out of range"));
        }

        let start = file_size - size as u64;
        let bytes = read_len(provider, start, size as u64)?;
        RandomIndexPack::parse(&bytes, start)
    }

    /// Parses a whole random index pack packet.
    ///
    /// `byte_offset` is where the packet starts in the resource.
    pub fn parse(bytes: &[u8], byte_offset: u64) -> Result<RandomIndexPack, MxfError> {
        let mut input = bytes;
        let packet = KlvPacket::parse(&mut input, byte_offset)?;

        if !packet.header.is_random_index_pack() {
            log::error!("Expected a random index pack, but found `{}`.", packet.header.key);
            return Err(MxfError::RandomIndexPack("wrong key"));
        }

        let value = packet.value;
        if value.len() < 4 || (value.len() - 4) % RIP_ENTRY_SIZE != 0 {
            log::error!("Random index pack value has `{}` bytes.", value.len());
            return Err(MxfError::RandomIndexPack("entries don't fill the pack"));
        }

        let (body, trailer) = value.split_at(value.len() - 4);
        let size = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if size as u64 != packet.header.total_size() {
            log::error!(
                "Random index pack says it's `{size}` bytes, but it's `{}`.",
                packet.header.total_size()
            );
            return Err(MxfError::RandomIndexPack("trailing size doesn't match the pack"));
        }

        let entries = body
            .chunks_exact(RIP_ENTRY_SIZE)
            .map(|c| {
                let (sid, off) = c.split_at(4);
                RipEntry {
                    body_sid: u32::from_be_bytes([sid[0], sid[1], sid[2], sid[3]]),
                    byte_offset: u64::from_be_bytes([
                        off[0], off[1], off[2], off[3], off[4], off[5], off[6], off[7],
                    ]),
                }
            })
            .collect::<Vec<_>>();

        if entries.windows(2).any(|w| w[0].byte_offset >= w[1].byte_offset) {
            log::error!("Random index pack offsets aren't in file order.");
            return Err(MxfError::RandomIndexPack("offsets aren't increasing"));
        }

        log::debug!("Random index pack lists `{}` partitions.", entries.len());
        Ok(RandomIndexPack { entries, size })
    }

    /// The partition offsets, in file order.
    pub fn offsets(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.byte_offset).collect()
    }
}

/// Every partition in a file, found through its random index pack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionLayout {
    pub partitions: Vec<PartitionPack>,
    pub rip: RandomIndexPack,
    pub resource_size: u64,
}

/// Finds and decodes every partition pack listed in the random index pack.
pub fn locate_partitions(
    provider: &(impl ResourceByteRangeProvider + ?Sized),
) -> Result<PartitionLayout, MxfError> {
    let rip = RandomIndexPack::read(provider)?;
    if rip.entries.is_empty() {
        return Err(MxfError::RandomIndexPack("no partitions listed"));
    }

    let partitions = rip
        .entries
        .iter()
        .map(|e| PartitionPack::read(provider, e.byte_offset))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PartitionLayout {
        partitions,
        rip,
        resource_size: provider.size(),
    })
}

impl PartitionLayout {
    /// Where the random index pack starts.
    pub fn rip_offset(&self) -> u64 {
        self.resource_size.saturating_sub(self.rip.size as u64)
    }

    pub fn header_partition(&self) -> Option<&PartitionPack> {
        self.partitions
            .first()
            .filter(|p| p.kind == PartitionKind::Header)
    }

    /// The header partition's `(start, length)`: from the first partition up
    /// to the second, or up to the random index pack when there's only one.
    pub fn header_partition_extent(&self) -> Option<(u64, u64)> {
        let start = self.partitions.first()?.byte_offset;
        let end = self
            .partitions
            .get(1)
            .map(|p| p.byte_offset)
            .unwrap_or_else(|| self.rip_offset());
        Some((start, end.checked_sub(start)?))
    }

    /// The byte extent of partition `i`.
    pub fn partition_extent(&self, i: usize) -> Option<(u64, u64)> {
        let start = self.partitions.get(i)?.byte_offset;
        let end = self
            .partitions
            .get(i + 1)
            .map(|p| p.byte_offset)
            .unwrap_or_else(|| self.rip_offset());
        Some((start, end.checked_sub(start)?))
    }

    pub fn body_partitions(&self) -> impl Iterator<Item = &PartitionPack> {
        self.partitions
            .iter()
            .filter(|p| p.kind == PartitionKind::Body)
    }

    pub fn footer_partition(&self) -> Option<&PartitionPack> {
        self.partitions
            .iter()
            .rev()
            .find(|p| p.kind == PartitionKind::Footer)
    }

    /// Partitions that carry essence.
    pub fn essence_partitions(&self) -> Vec<&PartitionPack> {
        self.partitions
            .iter()
            .filter(|p| p.has_essence_container())
            .collect()
    }

    /// Partitions that hold only index table segments.
    ///
    /// A partition with both index segments and essence isn't returned, and
    /// is logged as a non-fatal core constraints violation.
    pub fn index_partitions(&self, log: &mut ErrorLog) -> Vec<&PartitionPack> {
        let mut out = Vec::new();
        for p in &self.partitions {
            match (p.has_index_table_segments(), p.has_essence_container()) {
                (true, false) => out.push(p),
                (true, true) => log.add_error(
                    ErrorCode::ImfCoreConstraintsError,
                    ErrorLevel::NonFatal,
                    format!(
                        "Partition at offset `{}` has both index table segments and essence. Index segments must have a partition of their own.",
                        p.byte_offset
                    ),
                ),
                _ => (),
            }
        }
        out
    }
}

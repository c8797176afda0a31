//! Well-known Universal Labels.
//!
//! These are the keys and labels the validator looks for directly. Set keys
//! live in [`crate::sets`], and property ULs live in [`crate::properties`].

use crate::ul::Ul;

/// Partition packs share this key, except for byte 13 (header, body, or
/// footer) and byte 14 (open/closed, complete/incomplete).
pub const PARTITION_PACK_BASE: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x02, 0x04, 0x00,
]);

/// Compares the first 13 bytes of a partition pack key, minus the version.
pub const PARTITION_PACK_MASK: u16 = 0b1111_1110_1111_1001;

pub const PRIMER_PACK: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x05, 0x01, 0x00,
]);

pub const RANDOM_INDEX_PACK: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x11, 0x01, 0x00,
]);

pub const INDEX_TABLE_SEGMENT: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x10, 0x01, 0x00,
]);

/// KLV fill items pad out partitions. Old files use version `0x01`.
pub const FILL_ITEM: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x01, 0x01, 0x01, 0x02, 0x03, 0x01, 0x02, 0x10, 0x01, 0x00, 0x00, 0x00,
]);

/// Dynamic HDR (PHDR) metadata payloads, which can sit in the header
/// partition without being a local set.
pub const PHDR_METADATA_PAYLOAD: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x05, 0x0e, 0x09, 0x06, 0x07, 0x01, 0x01, 0x01, 0x03,
]);

pub const GENERIC_STREAM_DATA_ELEMENT: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x01, 0x01, 0x01, 0x0c, 0x0d, 0x01, 0x05, 0x09, 0x01, 0x00, 0x00, 0x00,
]);

/// Operational Pattern 1A: single item, single package.
pub const OP1A: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x01, 0x09, 0x00,
]);

/// Ignores the version byte (7) and the qualifier byte (14) of OP1A.
pub const OP1A_MASK: u16 = 0b1111_1110_1111_1101;

/// Byte 14 of an OP label holds its qualifiers.
pub const OP_QUALIFIER_BYTE: usize = 14;

//
// data definitions
//

pub const PICTURE_DATA_DEFINITION: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00,
]);

pub const SOUND_DATA_DEFINITION: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x02, 0x02, 0x00, 0x00, 0x00,
]);

pub const DATA_DATA_DEFINITION: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x02, 0x03, 0x00, 0x00, 0x00,
]);

pub const TIMECODE_DATA_DEFINITION: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00,
]);

//
// essence containers
//

pub const J2K_FRAME_WRAPPED_CONTAINER: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x07, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x0c, 0x01, 0x00,
]);

pub const WAVE_CLIP_WRAPPED_CONTAINER: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x06, 0x02, 0x00,
]);

pub const IAB_CLIP_WRAPPED_CONTAINER: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x0d, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x1d, 0x01, 0x00,
]);

pub const MGA_CLIP_WRAPPED_CONTAINER: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x0d, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x25, 0x01, 0x00,
]);

pub const ACES_FRAME_WRAPPED_CONTAINER: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x0d, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x19, 0x01, 0x00,
]);

//
// coding
//

/// All JPEG 2000 picture coding labels share bytes 0-13 (minus the version).
/// Bytes 14 and 15 name the profile.
pub const J2K_PICTURE_CODING_BASE: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x07, 0x04, 0x01, 0x02, 0x02, 0x03, 0x01, 0x00, 0x00,
]);

/// Compares bytes 0-13 of a picture coding label, minus the version.
pub const J2K_PICTURE_CODING_MASK: u16 = 0b1111_1110_1111_1100;

pub const IAB_SOUND_COMPRESSION: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x0d, 0x04, 0x02, 0x02, 0x02, 0x04, 0x00, 0x00, 0x00,
]);

pub const MGA_SOUND_COMPRESSION: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x0d, 0x04, 0x02, 0x02, 0x02, 0x05, 0x00, 0x00, 0x00,
]);

/// The channel assignment label IMF audio track files must carry.
pub const IMF_AUDIO_CHANNEL_ASSIGNMENT: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x0d, 0x04, 0x02, 0x02, 0x10, 0x04, 0x01, 0x00, 0x00,
]);

/// Checks whether `key` belongs to any kind of partition pack.
pub fn is_partition_pack(key: &Ul) -> bool {
    key.equals_with_mask(&PARTITION_PACK_BASE, PARTITION_PACK_MASK)
        && (0x02..=0x04).contains(&key.0[13])
}

/// Checks whether `key` is a KLV fill item, whatever its version.
pub fn is_fill_item(key: &Ul) -> bool {
    key.equals_ignoring_version(&FILL_ITEM)
}

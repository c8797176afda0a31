//! Writes small track files in memory, so tests don't need fixtures on disk.
//!
//! [`MinimalTrackFile::default`] builds an OP1A, clip-wrapped wave audio file
//! that passes every check in this crate. Each field flips one thing about
//! it.
//!
//! Instance UIDs are fixed, so tests can look sets up:
//!
//! | uid      | set                         |
//! |----------|-----------------------------|
//! | 1        | Preface                     |
//! | 2        | Identification              |
//! | 3        | ContentStorage              |
//! | 4        | EssenceContainerData        |
//! | 10-13    | material package, track, sequence, clip |
//! | 20-23    | file package, track, sequence, clip     |
//! | 30       | essence descriptor          |
//! | 31       | sub-descriptor              |

use imf_validation_types::{
    colorimetry::{CodingEquation, ColorPrimaries, TransferCharacteristic},
    labels,
    primitives::Rational,
    properties::PropertyId,
    sets::SetKind,
    ul::{MxfUid, Ul},
};

/// A generic container essence element. Nothing reads its value.
const ESSENCE_ELEMENT: Ul = Ul::from_u128(0x060e2b34_01020101_0d010301_16010101);

/// Where dangling references point.
const MISSING_DESCRIPTOR: u8 = 200;
const MISSING_SUB_DESCRIPTOR: u8 = 201;

/// An instance UID.
pub fn uid(n: u8) -> MxfUid {
    let mut bytes = [0_u8; 16];
    bytes[0] = 0xa5;
    bytes[15] = n;
    MxfUid::Uid(bytes)
}

/// A package UMID.
pub fn umid(n: u8) -> MxfUid {
    let mut bytes = [0_u8; 32];
    bytes[..12].copy_from_slice(&[
        0x06, 0x0a, 0x2b, 0x34, 0x01, 0x01, 0x01, 0x05, 0x01, 0x01, 0x0f, 0x20,
    ]);
    bytes[12] = 0x13;
    bytes[31] = n;
    MxfUid::Umid(bytes)
}

/// A KLV packet, always with a 4-byte length field.
pub fn klv(key: &Ul, value: &[u8]) -> Vec<u8> {
    let len = value.len() as u32;
    assert!(len < 1 << 24, "test packets are small");

    let mut out = Vec::with_capacity(16 + 4 + value.len());
    out.extend_from_slice(&key.0);
    out.push(0x83);
    out.extend_from_slice(&len.to_be_bytes()[1..]);
    out.extend_from_slice(value);
    out
}

/// Every field of a partition pack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionSpec {
    /// Key byte 13: `0x02` header, `0x03` body, `0x04` footer.
    pub kind: u8,
    /// Key byte 14: `0x01` to `0x04`.
    pub status: u8,
    pub this_partition: u64,
    pub previous_partition: u64,
    pub footer_partition: u64,
    pub header_byte_count: u64,
    pub index_byte_count: u64,
    pub index_sid: u32,
    pub body_sid: u32,
    pub operational_pattern: Ul,
    pub essence_containers: Vec<Ul>,
}

impl Default for PartitionSpec {
    fn default() -> Self {
        Self {
            kind: 0x02,
            status: 0x04,
            this_partition: 0,
            previous_partition: 0,
            footer_partition: 0,
            header_byte_count: 0,
            index_byte_count: 0,
            index_sid: 0,
            body_sid: 0,
            operational_pattern: labels::OP1A,
            essence_containers: Vec::new(),
        }
    }
}

/// The size of a whole partition pack packet listing `containers`.
fn partition_pack_size(containers: usize) -> u64 {
    16 + 4 + 88 + 16 * containers as u64
}

/// Writes a partition pack packet.
pub fn partition_pack(spec: &PartitionSpec) -> Vec<u8> {
    let mut key = labels::PARTITION_PACK_BASE;
    key.0[13] = spec.kind;
    key.0[14] = spec.status;

    let mut value = Vec::with_capacity(88 + 16 * spec.essence_containers.len());
    value.extend_from_slice(&1_u16.to_be_bytes());
    value.extend_from_slice(&3_u16.to_be_bytes());
    value.extend_from_slice(&1_u32.to_be_bytes());
    value.extend_from_slice(&spec.this_partition.to_be_bytes());
    value.extend_from_slice(&spec.previous_partition.to_be_bytes());
    value.extend_from_slice(&spec.footer_partition.to_be_bytes());
    value.extend_from_slice(&spec.header_byte_count.to_be_bytes());
    value.extend_from_slice(&spec.index_byte_count.to_be_bytes());
    value.extend_from_slice(&spec.index_sid.to_be_bytes());
    value.extend_from_slice(&0_u64.to_be_bytes());
    value.extend_from_slice(&spec.body_sid.to_be_bytes());
    value.extend_from_slice(&spec.operational_pattern.0);
    value.extend(batch(spec.essence_containers.iter().map(|ul| ul.0.to_vec())));

    klv(&key, &value)
}

/// Writes a random index pack from `(body SID, offset)` pairs.
pub fn random_index_pack(entries: &[(u32, u64)]) -> Vec<u8> {
    let mut value = Vec::with_capacity(entries.len() * 12 + 4);
    for (sid, offset) in entries {
        value.extend_from_slice(&sid.to_be_bytes());
        value.extend_from_slice(&offset.to_be_bytes());
    }
    let total = (16 + 4 + value.len() + 4) as u32;
    value.extend_from_slice(&total.to_be_bytes());

    klv(&labels::RANDOM_INDEX_PACK, &value)
}

/// A batch or array: count, element size, then the elements.
fn batch(elements: impl IntoIterator<Item = Vec<u8>>) -> Vec<u8> {
    let elements: Vec<Vec<u8>> = elements.into_iter().collect();
    let size = elements.first().map_or(16, Vec::len) as u32;

    let mut out = Vec::new();
    out.extend_from_slice(&(elements.len() as u32).to_be_bytes());
    out.extend_from_slice(&size.to_be_bytes());
    for e in elements {
        out.extend(e);
    }
    out
}

fn refs(uids: &[MxfUid]) -> Vec<u8> {
    batch(uids.iter().map(|u| u.as_bytes().to_vec()))
}

fn rational(r: Rational) -> Vec<u8> {
    let mut out = r.numerator.to_be_bytes().to_vec();
    out.extend_from_slice(&r.denominator.to_be_bytes());
    out
}

fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

/// The local tag every property gets in our primer.
fn local_tag(property: PropertyId) -> u16 {
    let index = PropertyId::ALL
        .iter()
        .position(|p| *p == property)
        .expect("every property is in `ALL`");
    0x8000 + index as u16
}

/// A primer pack mapping every known property.
fn primer_pack() -> Vec<u8> {
    let mut value = Vec::new();
    value.extend_from_slice(&(PropertyId::ALL.len() as u32).to_be_bytes());
    value.extend_from_slice(&18_u32.to_be_bytes());
    for property in PropertyId::ALL {
        value.extend_from_slice(&local_tag(*property).to_be_bytes());
        value.extend_from_slice(&property.ul().0);
    }
    klv(&labels::PRIMER_PACK, &value)
}

/// A local set under construction.
struct LocalSet {
    kind: SetKind,
    items: Vec<(PropertyId, Vec<u8>)>,
}

impl LocalSet {
    fn new(kind: SetKind, instance: u8) -> Self {
        Self {
            kind,
            items: vec![(PropertyId::InstanceUid, uid(instance).as_bytes().to_vec())],
        }
    }

    fn item(mut self, property: PropertyId, value: impl Into<Vec<u8>>) -> Self {
        assert!(self.kind.accepts(property), "{property:?} in {:?}", self.kind);
        self.items.push((property, value.into()));
        self
    }

    fn maybe(self, property: PropertyId, value: Option<Vec<u8>>) -> Self {
        match value {
            Some(v) => self.item(property, v),
            None => self,
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        for (property, bytes) in &self.items {
            value.extend_from_slice(&local_tag(*property).to_be_bytes());
            value.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
            value.extend_from_slice(bytes);
        }
        klv(&self.kind.key(), &value)
    }
}

/// A picture descriptor's contents.
#[derive(Clone, Debug, PartialEq)]
pub struct PictureSpec {
    /// RGBA instead of CDCI.
    pub rgba: bool,
    pub width: u32,
    pub height: u32,
    pub component_depth: u32,
    pub color_primaries: ColorPrimaries,
    pub transfer_characteristic: TransferCharacteristic,
    /// Only written for CDCI.
    pub coding_equation: CodingEquation,
    pub frame_layout: u8,
    pub picture_coding: Ul,
    pub essence_container: Ul,
}

impl Default for PictureSpec {
    fn default() -> Self {
        let mut picture_coding = labels::J2K_PICTURE_CODING_BASE;
        picture_coding.0[14] = 0x03;
        picture_coding.0[15] = 0x01;

        Self {
            rgba: false,
            width: 1920,
            height: 1080,
            component_depth: 10,
            color_primaries: ColorPrimaries::Itu709,
            transfer_characteristic: TransferCharacteristic::Itu709,
            coding_equation: CodingEquation::Itu709,
            frame_layout: 0,
            picture_coding,
            essence_container: labels::J2K_FRAME_WRAPPED_CONTAINER,
        }
    }
}

/// What the file package holds.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Essence {
    #[default]
    Wave,
    Iab,
    Mga,
    Picture(PictureSpec),
}

impl Essence {
    fn container(&self) -> Ul {
        match self {
            Essence::Wave => labels::WAVE_CLIP_WRAPPED_CONTAINER,
            Essence::Iab => labels::IAB_CLIP_WRAPPED_CONTAINER,
            Essence::Mga => labels::MGA_CLIP_WRAPPED_CONTAINER,
            Essence::Picture(p) => p.essence_container,
        }
    }

    fn data_definition(&self) -> Ul {
        match self {
            Essence::Picture(_) => labels::PICTURE_DATA_DEFINITION,
            _ => labels::SOUND_DATA_DEFINITION,
        }
    }
}

/// A single-track OP1A file.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimalTrackFile {
    pub material_edit_rate: Rational,
    pub material_duration: i64,
    pub file_edit_rate: Rational,
    pub file_duration: i64,
    pub operational_pattern: Ul,

    pub quantization_bits: u32,
    pub block_align: u16,
    pub sample_rate: Rational,
    pub channel_count: u32,

    /// The file package's descriptor reference points nowhere.
    pub dangling_descriptor: bool,
    /// The descriptor also lists a sub-descriptor that isn't there.
    pub dangling_sub_descriptor: bool,
    pub omit_primer: bool,
    /// The material package's clip plays some other package.
    pub clip_references_other_package: bool,
    pub omit_soundfield_group: bool,
    pub primary_package_is_material: bool,

    /// The body partition claims index table segments too.
    pub index_in_body: bool,
    /// The header partition claims essence too.
    pub essence_in_header: bool,
    pub extra_body_partitions: usize,

    pub essence: Essence,
}

impl Default for MinimalTrackFile {
    fn default() -> Self {
        Self {
            material_edit_rate: Rational::new(24, 1),
            material_duration: 48,
            file_edit_rate: Rational::new(24, 1),
            file_duration: 48,
            operational_pattern: labels::OP1A,
            quantization_bits: 24,
            block_align: 6,
            sample_rate: Rational::new(48_000, 1),
            channel_count: 2,
            dangling_descriptor: false,
            dangling_sub_descriptor: false,
            omit_primer: false,
            clip_references_other_package: false,
            omit_soundfield_group: false,
            primary_package_is_material: false,
            index_in_body: false,
            essence_in_header: false,
            extra_body_partitions: 0,
            essence: Essence::Wave,
        }
    }
}

/// A built file, with where its header partition sits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltFile {
    pub bytes: Vec<u8>,
    pub header_offset: u64,
    pub header_length: u64,
}

impl MinimalTrackFile {
    pub fn build(&self) -> BuiltFile {
        let container = self.essence.container();
        let metadata = self.header_metadata();
        let essence = klv(&ESSENCE_ELEMENT, &[0_u8; 64]);

        let pack_size = partition_pack_size(1);
        let body_size = pack_size + essence.len() as u64;
        let body_count = 1 + self.extra_body_partitions;

        let first_body = pack_size + metadata.len() as u64;
        let bodies: Vec<u64> = (0..body_count)
            .map(|i| first_body + i as u64 * body_size)
            .collect();
        let footer = first_body + body_count as u64 * body_size;

        let base = PartitionSpec {
            footer_partition: footer,
            operational_pattern: self.operational_pattern,
            essence_containers: vec![container],
            ..Default::default()
        };

        let mut bytes = partition_pack(&PartitionSpec {
            kind: 0x02,
            header_byte_count: metadata.len() as u64,
            body_sid: if self.essence_in_header { 1 } else { 0 },
            ..base.clone()
        });
        bytes.extend(metadata);
        let mut rip = vec![(if self.essence_in_header { 1 } else { 0 }, 0)];

        let mut previous = 0;
        for offset in &bodies {
            assert_eq!(bytes.len() as u64, *offset);
            bytes.extend(partition_pack(&PartitionSpec {
                kind: 0x03,
                this_partition: *offset,
                previous_partition: previous,
                index_byte_count: if self.index_in_body { 64 } else { 0 },
                index_sid: if self.index_in_body { 2 } else { 0 },
                body_sid: 1,
                ..base.clone()
            }));
            bytes.extend_from_slice(&essence);
            rip.push((1, *offset));
            previous = *offset;
        }

        assert_eq!(bytes.len() as u64, footer);
        bytes.extend(partition_pack(&PartitionSpec {
            kind: 0x04,
            this_partition: footer,
            previous_partition: previous,
            ..base
        }));
        rip.push((0, footer));
        bytes.extend(random_index_pack(&rip));

        BuiltFile {
            bytes,
            header_offset: 0,
            header_length: first_body,
        }
    }

    /// The primer and every set, in file order.
    fn header_metadata(&self) -> Vec<u8> {
        use PropertyId as P;

        let data_definition = self.essence.data_definition().0.to_vec();
        let file_package = umid(2);
        let clip_target = if self.clip_references_other_package {
            umid(99)
        } else {
            file_package
        };

        let mut sets = vec![
            LocalSet::new(SetKind::Preface, 1)
                .item(P::ContentStorage, uid(3).as_bytes())
                .item(P::OperationalPattern, self.operational_pattern.0)
                .item(P::EssenceContainers, batch([self.essence.container().0.to_vec()]))
                .item(
                    P::PrimaryPackage,
                    uid(if self.primary_package_is_material { 10 } else { 20 }).as_bytes(),
                )
                .item(P::Identifications, refs(&[uid(2)])),
            LocalSet::new(SetKind::Identification, 2)
                .item(P::CompanyName, utf16("imf_validation"))
                .item(P::ProductName, utf16("mxf_builder")),
            LocalSet::new(SetKind::ContentStorage, 3)
                .item(P::Packages, refs(&[uid(10), uid(20)]))
                .item(P::EssenceContainerData, refs(&[uid(4)])),
            LocalSet::new(SetKind::EssenceContainerData, 4)
                .item(P::LinkedPackageUid, file_package.as_bytes())
                .item(P::IndexSid, 0_u32.to_be_bytes())
                .item(P::BodySid, 1_u32.to_be_bytes()),
            // material package
            LocalSet::new(SetKind::MaterialPackage, 10)
                .item(P::PackageUid, umid(1).as_bytes())
                .item(P::Tracks, refs(&[uid(11)])),
            LocalSet::new(SetKind::TimelineTrack, 11)
                .item(P::TrackId, 2_u32.to_be_bytes())
                .item(P::EditRate, rational(self.material_edit_rate))
                .item(P::Sequence, uid(12).as_bytes()),
            LocalSet::new(SetKind::Sequence, 12)
                .item(P::DataDefinition, data_definition.clone())
                .item(P::Duration, self.material_duration.to_be_bytes())
                .item(P::StructuralComponents, refs(&[uid(13)])),
            LocalSet::new(SetKind::SourceClip, 13)
                .item(P::DataDefinition, data_definition.clone())
                .item(P::Duration, self.material_duration.to_be_bytes())
                .item(P::StartPosition, 0_i64.to_be_bytes())
                .item(P::SourcePackageId, clip_target.as_bytes())
                .item(P::SourceTrackId, 1_u32.to_be_bytes()),
            // file package
            LocalSet::new(SetKind::SourcePackage, 20)
                .item(P::PackageUid, file_package.as_bytes())
                .item(P::Tracks, refs(&[uid(21)]))
                .item(
                    P::Descriptor,
                    uid(if self.dangling_descriptor { MISSING_DESCRIPTOR } else { 30 }).as_bytes(),
                ),
            LocalSet::new(SetKind::TimelineTrack, 21)
                .item(P::TrackId, 1_u32.to_be_bytes())
                .item(P::EditRate, rational(self.file_edit_rate))
                .item(P::Sequence, uid(22).as_bytes()),
            LocalSet::new(SetKind::Sequence, 22)
                .item(P::DataDefinition, data_definition.clone())
                .item(P::Duration, self.file_duration.to_be_bytes())
                .item(P::StructuralComponents, refs(&[uid(23)])),
            LocalSet::new(SetKind::SourceClip, 23)
                .item(P::DataDefinition, data_definition)
                .item(P::Duration, self.file_duration.to_be_bytes())
                .item(P::StartPosition, 0_i64.to_be_bytes())
                .item(P::SourcePackageId, [0_u8; 32])
                .item(P::SourceTrackId, 0_u32.to_be_bytes()),
        ];
        sets.extend(self.descriptor_sets());

        let mut out = Vec::new();
        if !self.omit_primer {
            out.extend(primer_pack());
        }
        for set in &sets {
            out.extend(set.encode());
        }
        out
    }

    /// The essence descriptor and its sub-descriptors.
    fn descriptor_sets(&self) -> Vec<LocalSet> {
        use PropertyId as P;

        let mut sub_descriptors = Vec::new();
        if !self.omit_soundfield_group && !matches!(self.essence, Essence::Picture(_)) {
            sub_descriptors.push(uid(31));
        }
        if self.dangling_sub_descriptor {
            sub_descriptors.push(uid(MISSING_SUB_DESCRIPTOR));
        }

        let kind = match &self.essence {
            Essence::Wave => SetKind::WaveAudioEssenceDescriptor,
            Essence::Iab => SetKind::IabEssenceDescriptor,
            Essence::Mga => SetKind::MgaSoundEssenceDescriptor,
            Essence::Picture(p) if p.rgba => SetKind::RgbaPictureEssenceDescriptor,
            Essence::Picture(_) => SetKind::CdciPictureEssenceDescriptor,
        };

        let mut descriptor = LocalSet::new(kind, 30)
            .item(P::SampleRate, rational(self.file_edit_rate))
            .item(P::EssenceContainer, self.essence.container().0);
        if !sub_descriptors.is_empty() {
            descriptor = descriptor.item(P::SubDescriptors, refs(&sub_descriptors));
        }

        let picture = match &self.essence {
            Essence::Picture(p) => p,
            audio => {
                let channel_count = match audio {
                    Essence::Iab => 0,
                    _ => self.channel_count,
                };
                descriptor = descriptor
                    .item(P::AudioSamplingRate, rational(self.sample_rate))
                    .item(P::ChannelCount, channel_count.to_be_bytes())
                    .item(P::QuantizationBits, self.quantization_bits.to_be_bytes());

                let (label_kind, dictionary_id, symbol) = match audio {
                    Essence::Iab => {
                        descriptor = descriptor
                            .item(P::SoundCompression, labels::IAB_SOUND_COMPRESSION.0);
                        (
                            SetKind::IabSoundfieldLabelSubDescriptor,
                            0x060e2b34_0401010d_03020221_00000000,
                            "IAB",
                        )
                    }
                    Essence::Mga => {
                        descriptor = descriptor
                            .item(P::SoundCompression, labels::MGA_SOUND_COMPRESSION.0);
                        (
                            SetKind::MgaSoundfieldGroupLabelSubDescriptor,
                            0x060e2b34_0401010d_03020222_00000000,
                            "MGA",
                        )
                    }
                    _ => {
                        descriptor = descriptor
                            .item(P::BlockAlign, self.block_align.to_be_bytes())
                            .item(P::ChannelAssignment, labels::IMF_AUDIO_CHANNEL_ASSIGNMENT.0);
                        (
                            SetKind::SoundfieldGroupLabelSubDescriptor,
                            0x060e2b34_0401010d_03020220_00000000,
                            "sgST",
                        )
                    }
                };

                let mut sets = vec![descriptor];
                if !self.omit_soundfield_group {
                    let mut label = LocalSet::new(label_kind, 31)
                        .item(P::McaLabelDictionaryId, Ul::from_u128(dictionary_id).0)
                        .item(P::McaTagSymbol, utf16(symbol))
                        .item(P::McaLinkId, uid(40).as_bytes());
                    if label_kind == SetKind::MgaSoundfieldGroupLabelSubDescriptor {
                        label = label
                            .item(P::MgaMetadataSectionLinkId, uid(41).as_bytes())
                            .item(P::AdmAudioProgrammeId, utf16("APR_1001"));
                    }
                    sets.push(label);
                }
                return sets;
            }
        };

        descriptor = descriptor
            .item(P::FrameLayout, [picture.frame_layout])
            .item(P::StoredWidth, picture.width.to_be_bytes())
            .item(P::StoredHeight, picture.height.to_be_bytes())
            .item(P::PictureCompression, picture.picture_coding.0)
            .maybe(
                P::TransferCharacteristic,
                picture.transfer_characteristic.ul().map(|ul| ul.0.to_vec()),
            )
            .maybe(
                P::ColorPrimaries,
                picture.color_primaries.ul().map(|ul| ul.0.to_vec()),
            );

        let depth = picture.component_depth;
        descriptor = if picture.rgba {
            descriptor
                .item(P::ComponentMinRef, 0_u32.to_be_bytes())
                .item(P::ComponentMaxRef, ((1_u32 << depth) - 1).to_be_bytes())
        } else {
            let shift = depth.saturating_sub(8);
            descriptor
                .maybe(
                    P::CodingEquations,
                    picture.coding_equation.ul().map(|ul| ul.0.to_vec()),
                )
                .item(P::ComponentDepth, depth.to_be_bytes())
                .item(P::HorizontalSubsampling, 2_u32.to_be_bytes())
                .item(P::VerticalSubsampling, 1_u32.to_be_bytes())
                .item(P::BlackRefLevel, (16_u32 << shift).to_be_bytes())
                .item(P::WhiteRefLevel, (235_u32 << shift).to_be_bytes())
        };

        vec![descriptor]
    }
}

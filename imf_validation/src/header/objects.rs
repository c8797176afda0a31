//! Typed metadata sets.
//!
//! Each set in the header partition is decoded into a loose bag of
//! properties first, then converted into one of the structs below. References
//! to other sets start out as bare UIDs and are resolved into arena indices
//! once the whole partition has been read.

use rustc_hash::FxHashMap;

use imf_validation_types::{
    labels,
    primitives::{Rational, Timestamp},
    properties::PropertyId,
    sets::SetKind,
    ul::{MxfUid, Ul},
};

use crate::{error::MxfError, populate::PropertyValue};

/// An index into a header partition's set arena.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct SetIndex(pub(crate) usize);

impl SetIndex {
    pub fn get(&self) -> usize {
        self.0
    }
}

/// A strong reference to another set.
///
/// `target` is filled in after parsing, once every set is known.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct StrongRef {
    pub uid: MxfUid,
    pub target: Option<SetIndex>,
}

impl StrongRef {
    pub fn new(uid: MxfUid) -> Self {
        Self { uid, target: None }
    }
}

/// What kind of essence a track or component carries.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum MxfDataDefinition {
    Picture,
    Sound,
    Data,
    Other,
}

impl MxfDataDefinition {
    pub fn from_ul(ul: &Ul) -> Self {
        if ul.equals_ignoring_version(&labels::PICTURE_DATA_DEFINITION) {
            MxfDataDefinition::Picture
        } else if ul.equals_ignoring_version(&labels::SOUND_DATA_DEFINITION) {
            MxfDataDefinition::Sound
        } else if ul.equals_ignoring_version(&labels::DATA_DATA_DEFINITION) {
            MxfDataDefinition::Data
        } else {
            MxfDataDefinition::Other
        }
    }

    /// Whether this is picture, sound, or data essence.
    pub fn is_essence(&self) -> bool {
        *self != MxfDataDefinition::Other
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Preface {
    pub last_modified_date: Option<Timestamp>,
    pub version: Option<u16>,
    pub object_model_version: Option<u32>,

    /// A weak reference to the primary package's instance UID.
    pub primary_package: Option<MxfUid>,
    pub identifications: Vec<StrongRef>,
    pub content_storage: StrongRef,
    pub operational_pattern: Ul,
    pub essence_containers: Vec<Ul>,
    pub dm_schemes: Vec<Ul>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Identification {
    pub this_generation_uid: Option<MxfUid>,
    pub company_name: Option<String>,
    pub product_name: Option<String>,
    pub version_string: Option<String>,
    pub product_uid: Option<MxfUid>,
    pub modification_date: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContentStorage {
    pub packages: Vec<StrongRef>,
    pub essence_container_data: Vec<StrongRef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EssenceContainerData {
    pub linked_package_uid: MxfUid,
    pub index_sid: Option<u32>,
    pub body_sid: Option<u32>,
}

/// A material or source package.
#[derive(Clone, Debug, PartialEq)]
pub struct Package {
    /// The package's UMID.
    pub package_uid: MxfUid,
    pub name: Option<String>,
    pub creation_date: Option<Timestamp>,
    pub modified_date: Option<Timestamp>,
    pub tracks: Vec<StrongRef>,

    /// Only source packages have descriptors.
    pub descriptor: Option<StrongRef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineTrack {
    pub track_id: u32,
    pub track_number: Option<u32>,
    pub name: Option<String>,
    pub sequence: StrongRef,
    pub edit_rate: Rational,
    pub origin: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    pub data_definition: Ul,
    pub duration: Option<i64>,
    pub structural_components: Vec<StrongRef>,
}

impl Sequence {
    pub fn data_kind(&self) -> MxfDataDefinition {
        MxfDataDefinition::from_ul(&self.data_definition)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceClip {
    pub data_definition: Ul,
    pub duration: Option<i64>,
    pub start_position: Option<i64>,
    pub source_package_id: MxfUid,
    pub source_track_id: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimecodeComponent {
    pub data_definition: Ul,
    pub duration: Option<i64>,
    pub rounded_timecode_base: u16,
    pub start_timecode: i64,
    pub drop_frame: bool,
}

/// Properties every file descriptor has.
#[derive(Clone, Debug, PartialEq)]
pub struct FileDescriptor {
    pub sub_descriptors: Vec<StrongRef>,
    pub linked_track_id: Option<u32>,
    pub sample_rate: Rational,
    pub container_duration: Option<i64>,
    pub essence_container: Ul,
}

/// Properties every picture descriptor has.
#[derive(Clone, Debug, PartialEq)]
pub struct PictureDescriptor {
    pub file: FileDescriptor,
    pub frame_layout: Option<u8>,
    pub stored_width: u32,
    pub stored_height: u32,
    pub display_width: Option<u32>,
    pub display_height: Option<u32>,
    pub aspect_ratio: Option<Rational>,
    pub video_line_map: Vec<i32>,
    pub picture_compression: Option<Ul>,
    pub transfer_characteristic: Option<Ul>,
    pub coding_equations: Option<Ul>,
    pub color_primaries: Option<Ul>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CdciDescriptor {
    pub picture: PictureDescriptor,
    pub component_depth: u32,
    pub horizontal_subsampling: u32,
    pub vertical_subsampling: Option<u32>,
    pub color_siting: Option<u8>,
    pub black_ref_level: Option<u32>,
    pub white_ref_level: Option<u32>,
    pub color_range: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RgbaDescriptor {
    pub picture: PictureDescriptor,
    pub component_max_ref: Option<u32>,
    pub component_min_ref: Option<u32>,
    pub pixel_layout: Option<Vec<u8>>,
}

/// Properties every sound descriptor has.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundDescriptor {
    pub file: FileDescriptor,
    pub audio_sampling_rate: Rational,
    pub locked: Option<bool>,
    pub audio_ref_level: Option<i8>,
    pub channel_count: u32,
    pub quantization_bits: u32,
    pub sound_compression: Option<Ul>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaveAudioDescriptor {
    pub sound: SoundDescriptor,
    pub block_align: u16,
    pub average_bytes_per_second: Option<u32>,
    pub channel_assignment: Option<Ul>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MgaSoundDescriptor {
    pub sound: SoundDescriptor,
    pub block_align: Option<u16>,
    pub average_bytes_per_second: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Jpeg2000SubDescriptor {
    pub rsiz: u16,
    pub xsiz: u32,
    pub ysiz: u32,
    pub xosiz: u32,
    pub yosiz: u32,
    pub xtsiz: u32,
    pub ytsiz: u32,
    pub xtosiz: u32,
    pub ytosiz: u32,
    pub csiz: u16,

    /// `(Ssiz, XRsiz, YRsiz)` for each component.
    pub picture_component_sizing: Vec<[u8; 3]>,
    pub coding_style_default: Option<Vec<u8>>,
    pub quantization_default: Option<Vec<u8>>,
    pub j2c_layout: Option<Vec<u8>>,
    pub extended_capabilities: Option<Vec<u8>>,
}

/// Any multichannel audio label sub-descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct McaLabel {
    pub label_dictionary_id: Ul,
    pub tag_symbol: String,
    pub tag_name: Option<String>,
    pub link_id: Option<MxfUid>,
    pub channel_id: Option<u32>,
    pub spoken_language: Option<String>,
    pub soundfield_group_link_id: Option<MxfUid>,
    pub group_of_soundfield_groups_link_ids: Vec<MxfUid>,
    pub mga_metadata_section_link_id: Option<MxfUid>,
    pub adm_audio_programme_id: Option<String>,
}

/// The typed contents of a set.
#[derive(Clone, Debug, PartialEq)]
pub enum SetBody {
    Preface(Preface),
    Identification(Identification),
    ContentStorage(ContentStorage),
    EssenceContainerData(EssenceContainerData),
    MaterialPackage(Package),
    SourcePackage(Package),
    TimelineTrack(TimelineTrack),
    Sequence(Sequence),
    SourceClip(SourceClip),
    TimecodeComponent(TimecodeComponent),
    CdciDescriptor(CdciDescriptor),
    RgbaDescriptor(RgbaDescriptor),
    WaveAudioDescriptor(WaveAudioDescriptor),
    IabDescriptor(SoundDescriptor),
    MgaSoundDescriptor(MgaSoundDescriptor),
    Jpeg2000SubDescriptor(Jpeg2000SubDescriptor),
    McaLabel(McaLabel),
}

/// A set in the header partition.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataSet {
    pub kind: SetKind,
    pub instance_uid: MxfUid,

    /// Where the set's KLV packet starts in the resource.
    pub byte_offset: u64,
    pub body: SetBody,
}

/// A reference field, handed out during resolution.
pub(crate) struct RefSlot<'a> {
    pub property: PropertyId,

    /// Whether an unresolved target makes the partition unusable.
    pub required: bool,

    /// The kinds of set this reference may point at.
    pub accepts: fn(&SetKind) -> bool,

    pub reference: &'a mut StrongRef,
}

impl MetadataSet {
    pub fn as_preface(&self) -> Option<&Preface> {
        match &self.body {
            SetBody::Preface(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_identification(&self) -> Option<&Identification> {
        match &self.body {
            SetBody::Identification(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_content_storage(&self) -> Option<&ContentStorage> {
        match &self.body {
            SetBody::ContentStorage(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_essence_container_data(&self) -> Option<&EssenceContainerData> {
        match &self.body {
            SetBody::EssenceContainerData(e) => Some(e),
            _ => None,
        }
    }

    /// Either kind of package.
    pub fn as_package(&self) -> Option<&Package> {
        match &self.body {
            SetBody::MaterialPackage(p) | SetBody::SourcePackage(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_track(&self) -> Option<&TimelineTrack> {
        match &self.body {
            SetBody::TimelineTrack(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.body {
            SetBody::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_source_clip(&self) -> Option<&SourceClip> {
        match &self.body {
            SetBody::SourceClip(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_jpeg2000_sub_descriptor(&self) -> Option<&Jpeg2000SubDescriptor> {
        match &self.body {
            SetBody::Jpeg2000SubDescriptor(j) => Some(j),
            _ => None,
        }
    }

    pub fn as_mca_label(&self) -> Option<&McaLabel> {
        match &self.body {
            SetBody::McaLabel(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_wave_audio_descriptor(&self) -> Option<&WaveAudioDescriptor> {
        match &self.body {
            SetBody::WaveAudioDescriptor(w) => Some(w),
            _ => None,
        }
    }

    /// The file descriptor part of any essence descriptor.
    pub fn as_file_descriptor(&self) -> Option<&FileDescriptor> {
        match &self.body {
            SetBody::CdciDescriptor(d) => Some(&d.picture.file),
            SetBody::RgbaDescriptor(d) => Some(&d.picture.file),
            SetBody::WaveAudioDescriptor(d) => Some(&d.sound.file),
            SetBody::IabDescriptor(d) => Some(&d.file),
            SetBody::MgaSoundDescriptor(d) => Some(&d.sound.file),
            _ => None,
        }
    }

    /// The picture part of a CDCI or RGBA descriptor.
    pub fn as_picture_descriptor(&self) -> Option<&PictureDescriptor> {
        match &self.body {
            SetBody::CdciDescriptor(d) => Some(&d.picture),
            SetBody::RgbaDescriptor(d) => Some(&d.picture),
            _ => None,
        }
    }

    /// The sound part of any sound descriptor.
    pub fn as_sound_descriptor(&self) -> Option<&SoundDescriptor> {
        match &self.body {
            SetBody::WaveAudioDescriptor(d) => Some(&d.sound),
            SetBody::IabDescriptor(d) => Some(d),
            SetBody::MgaSoundDescriptor(d) => Some(&d.sound),
            _ => None,
        }
    }

    /// Every reference this set holds, for resolution.
    pub(crate) fn references_mut(&mut self) -> Vec<RefSlot<'_>> {
        fn slot(
            property: PropertyId,
            required: bool,
            accepts: fn(&SetKind) -> bool,
            reference: &mut StrongRef,
        ) -> RefSlot<'_> {
            RefSlot {
                property,
                required,
                accepts,
                reference,
            }
        }

        fn many(
            property: PropertyId,
            required: bool,
            accepts: fn(&SetKind) -> bool,
            refs: &mut [StrongRef],
        ) -> impl Iterator<Item = RefSlot<'_>> {
            refs.iter_mut()
                .map(move |r| slot(property, required, accepts, r))
        }

        let mut out = Vec::new();
        match &mut self.body {
            SetBody::Preface(p) => {
                out.push(slot(
                    PropertyId::ContentStorage,
                    true,
                    |k| *k == SetKind::ContentStorage,
                    &mut p.content_storage,
                ));
                out.extend(many(
                    PropertyId::Identifications,
                    false,
                    |k| *k == SetKind::Identification,
                    &mut p.identifications,
                ));
            }
            SetBody::ContentStorage(c) => {
                out.extend(many(
                    PropertyId::Packages,
                    true,
                    |k| matches!(k, SetKind::MaterialPackage | SetKind::SourcePackage),
                    &mut c.packages,
                ));
                out.extend(many(
                    PropertyId::EssenceContainerData,
                    true,
                    |k| *k == SetKind::EssenceContainerData,
                    &mut c.essence_container_data,
                ));
            }
            SetBody::MaterialPackage(p) | SetBody::SourcePackage(p) => {
                out.extend(many(
                    PropertyId::Tracks,
                    true,
                    |k| *k == SetKind::TimelineTrack,
                    &mut p.tracks,
                ));
                if let Some(d) = p.descriptor.as_mut() {
                    out.push(slot(
                        PropertyId::Descriptor,
                        true,
                        SetKind::is_essence_descriptor,
                        d,
                    ));
                }
            }
            SetBody::TimelineTrack(t) => out.push(slot(
                PropertyId::Sequence,
                true,
                |k| *k == SetKind::Sequence,
                &mut t.sequence,
            )),
            SetBody::Sequence(s) => out.extend(many(
                PropertyId::StructuralComponents,
                true,
                |k| matches!(k, SetKind::SourceClip | SetKind::TimecodeComponent),
                &mut s.structural_components,
            )),
            SetBody::CdciDescriptor(CdciDescriptor { picture, .. })
            | SetBody::RgbaDescriptor(RgbaDescriptor { picture, .. }) => out.extend(many(
                PropertyId::SubDescriptors,
                false,
                SetKind::is_sub_descriptor,
                &mut picture.file.sub_descriptors,
            )),
            SetBody::WaveAudioDescriptor(WaveAudioDescriptor { sound, .. })
            | SetBody::MgaSoundDescriptor(MgaSoundDescriptor { sound, .. })
            | SetBody::IabDescriptor(sound) => out.extend(many(
                PropertyId::SubDescriptors,
                false,
                SetKind::is_sub_descriptor,
                &mut sound.file.sub_descriptors,
            )),
            SetBody::Identification(_)
            | SetBody::EssenceContainerData(_)
            | SetBody::SourceClip(_)
            | SetBody::TimecodeComponent(_)
            | SetBody::Jpeg2000SubDescriptor(_)
            | SetBody::McaLabel(_) => (),
        }
        out
    }
}

/// The decoded properties of one local set, before typing.
pub(crate) struct RawSet {
    pub kind: SetKind,
    pub byte_offset: u64,
    pub values: FxHashMap<PropertyId, PropertyValue>,
}

impl RawSet {
    fn opt<T>(&self, id: PropertyId, f: impl FnOnce(&PropertyValue) -> Option<T>) -> Option<T> {
        self.values.get(&id).and_then(f)
    }

    fn req<T>(
        &self,
        id: PropertyId,
        f: impl FnOnce(&PropertyValue) -> Option<T>,
    ) -> Result<T, MxfError> {
        self.opt(id, f).ok_or_else(|| {
            log::error!(
                "`{}` set at `{}` is missing required `{}`.",
                self.kind.name(),
                self.byte_offset,
                id.name()
            );
            MxfError::MissingProperty {
                set: self.kind,
                property: id,
            }
        })
    }

    fn string(&self, id: PropertyId) -> Option<String> {
        self.opt(id, |v| v.as_string().map(str::to_string))
    }

    fn bytes(&self, id: PropertyId) -> Option<Vec<u8>> {
        self.opt(id, |v| v.as_bytes().map(<[u8]>::to_vec))
    }

    fn uls(&self, id: PropertyId) -> Vec<Ul> {
        self.opt(id, PropertyValue::as_uls).unwrap_or_default()
    }

    fn refs(&self, id: PropertyId) -> Vec<StrongRef> {
        self.opt(id, PropertyValue::as_uids)
            .unwrap_or_default()
            .into_iter()
            .map(StrongRef::new)
            .collect()
    }

    fn strong_ref(&self, id: PropertyId) -> Result<StrongRef, MxfError> {
        self.req(id, PropertyValue::as_uid).map(StrongRef::new)
    }

    /// Converts into a typed set.
    pub fn into_set(self) -> Result<MetadataSet, MxfError> {
        use PropertyId as P;

        let instance_uid = self.opt(P::InstanceUid, PropertyValue::as_uid).ok_or_else(|| {
            log::error!("`{}` set at `{}` has no instance UID.", self.kind.name(), self.byte_offset);
            MxfError::MissingInstanceUid(self.kind)
        })?;

        let body = match self.kind {
            SetKind::Preface => SetBody::Preface(Preface {
                last_modified_date: self.opt(P::LastModifiedDate, PropertyValue::as_timestamp),
                version: self.opt(P::Version, PropertyValue::as_u16),
                object_model_version: self.opt(P::ObjectModelVersion, PropertyValue::as_u32),
                primary_package: self.opt(P::PrimaryPackage, PropertyValue::as_uid),
                identifications: self.refs(P::Identifications),
                content_storage: self.strong_ref(P::ContentStorage)?,
                operational_pattern: self.req(P::OperationalPattern, PropertyValue::as_ul)?,
                essence_containers: self.uls(P::EssenceContainers),
                dm_schemes: self.uls(P::DmSchemes),
            }),

            SetKind::Identification => SetBody::Identification(Identification {
                this_generation_uid: self.opt(P::ThisGenerationUid, PropertyValue::as_uid),
                company_name: self.string(P::CompanyName),
                product_name: self.string(P::ProductName),
                version_string: self.string(P::VersionString),
                product_uid: self.opt(P::ProductUid, PropertyValue::as_uid),
                modification_date: self.opt(P::ModificationDate, PropertyValue::as_timestamp),
            }),

            SetKind::ContentStorage => SetBody::ContentStorage(ContentStorage {
                packages: self.refs(P::Packages),
                essence_container_data: self.refs(P::EssenceContainerData),
            }),

            SetKind::EssenceContainerData => {
                SetBody::EssenceContainerData(EssenceContainerData {
                    linked_package_uid: self.req(P::LinkedPackageUid, PropertyValue::as_uid)?,
                    index_sid: self.opt(P::IndexSid, PropertyValue::as_u32),
                    body_sid: self.opt(P::BodySid, PropertyValue::as_u32),
                })
            }

            SetKind::MaterialPackage => SetBody::MaterialPackage(self.package(false)?),
            SetKind::SourcePackage => SetBody::SourcePackage(self.package(true)?),

            SetKind::TimelineTrack => SetBody::TimelineTrack(TimelineTrack {
                track_id: self.req(P::TrackId, PropertyValue::as_u32)?,
                track_number: self.opt(P::TrackNumber, PropertyValue::as_u32),
                name: self.string(P::TrackName),
                sequence: self.strong_ref(P::Sequence)?,
                edit_rate: self.req(P::EditRate, PropertyValue::as_rational)?,
                origin: self.opt(P::Origin, PropertyValue::as_i64),
            }),

            SetKind::Sequence => SetBody::Sequence(Sequence {
                data_definition: self.req(P::DataDefinition, PropertyValue::as_ul)?,
                duration: self.opt(P::Duration, PropertyValue::as_i64),
                structural_components: self.refs(P::StructuralComponents),
            }),

            SetKind::SourceClip => SetBody::SourceClip(SourceClip {
                data_definition: self.req(P::DataDefinition, PropertyValue::as_ul)?,
                duration: self.opt(P::Duration, PropertyValue::as_i64),
                start_position: self.opt(P::StartPosition, PropertyValue::as_i64),
                source_package_id: self.req(P::SourcePackageId, PropertyValue::as_uid)?,
                source_track_id: self.req(P::SourceTrackId, PropertyValue::as_u32)?,
            }),

            SetKind::TimecodeComponent => SetBody::TimecodeComponent(TimecodeComponent {
                data_definition: self.req(P::DataDefinition, PropertyValue::as_ul)?,
                duration: self.opt(P::Duration, PropertyValue::as_i64),
                rounded_timecode_base: self.req(P::RoundedTimecodeBase, PropertyValue::as_u16)?,
                start_timecode: self.req(P::StartTimecode, PropertyValue::as_i64)?,
                drop_frame: self.opt(P::DropFrame, PropertyValue::as_bool).unwrap_or(false),
            }),

            SetKind::CdciPictureEssenceDescriptor => SetBody::CdciDescriptor(CdciDescriptor {
                picture: self.picture()?,
                component_depth: self.req(P::ComponentDepth, PropertyValue::as_u32)?,
                horizontal_subsampling: self.req(P::HorizontalSubsampling, PropertyValue::as_u32)?,
                vertical_subsampling: self.opt(P::VerticalSubsampling, PropertyValue::as_u32),
                color_siting: self.opt(P::ColorSiting, PropertyValue::as_u8),
                black_ref_level: self.opt(P::BlackRefLevel, PropertyValue::as_u32),
                white_ref_level: self.opt(P::WhiteRefLevel, PropertyValue::as_u32),
                color_range: self.opt(P::ColorRange, PropertyValue::as_u32),
            }),

            SetKind::RgbaPictureEssenceDescriptor => SetBody::RgbaDescriptor(RgbaDescriptor {
                picture: self.picture()?,
                component_max_ref: self.opt(P::ComponentMaxRef, PropertyValue::as_u32),
                component_min_ref: self.opt(P::ComponentMinRef, PropertyValue::as_u32),
                pixel_layout: self.bytes(P::PixelLayout),
            }),

            SetKind::WaveAudioEssenceDescriptor => {
                SetBody::WaveAudioDescriptor(WaveAudioDescriptor {
                    sound: self.sound()?,
                    block_align: self.req(P::BlockAlign, PropertyValue::as_u16)?,
                    average_bytes_per_second: self
                        .opt(P::AverageBytesPerSecond, PropertyValue::as_u32),
                    channel_assignment: self.opt(P::ChannelAssignment, PropertyValue::as_ul),
                })
            }

            SetKind::IabEssenceDescriptor => SetBody::IabDescriptor(self.sound()?),

            SetKind::MgaSoundEssenceDescriptor => {
                SetBody::MgaSoundDescriptor(MgaSoundDescriptor {
                    sound: self.sound()?,
                    block_align: self.opt(P::MgaSoundEssenceBlockAlign, PropertyValue::as_u16),
                    average_bytes_per_second: self.opt(
                        P::MgaSoundEssenceAverageBytesPerSecond,
                        PropertyValue::as_u32,
                    ),
                })
            }

            SetKind::Jpeg2000PictureSubDescriptor => {
                SetBody::Jpeg2000SubDescriptor(Jpeg2000SubDescriptor {
                    rsiz: self.req(P::Rsiz, PropertyValue::as_u16)?,
                    xsiz: self.req(P::Xsiz, PropertyValue::as_u32)?,
                    ysiz: self.req(P::Ysiz, PropertyValue::as_u32)?,
                    xosiz: self.req(P::XOsiz, PropertyValue::as_u32)?,
                    yosiz: self.req(P::YOsiz, PropertyValue::as_u32)?,
                    xtsiz: self.req(P::XTsiz, PropertyValue::as_u32)?,
                    ytsiz: self.req(P::YTsiz, PropertyValue::as_u32)?,
                    xtosiz: self.req(P::XTOsiz, PropertyValue::as_u32)?,
                    ytosiz: self.req(P::YTOsiz, PropertyValue::as_u32)?,
                    csiz: self.req(P::Csiz, PropertyValue::as_u16)?,
                    picture_component_sizing: self
                        .opt(P::PictureComponentSizing, |v| {
                            v.as_records().map(|records| {
                                records
                                    .into_iter()
                                    .filter_map(|r| <[u8; 3]>::try_from(r).ok())
                                    .collect::<Vec<_>>()
                            })
                        })
                        .unwrap_or_default(),
                    coding_style_default: self.bytes(P::CodingStyleDefault),
                    quantization_default: self.bytes(P::QuantizationDefault),
                    j2c_layout: self.bytes(P::J2cLayout),
                    extended_capabilities: self.bytes(P::J2kExtendedCapabilities),
                })
            }

            SetKind::AudioChannelLabelSubDescriptor
            | SetKind::SoundfieldGroupLabelSubDescriptor
            | SetKind::GroupOfSoundfieldGroupsLabelSubDescriptor
            | SetKind::IabSoundfieldLabelSubDescriptor
            | SetKind::MgaSoundfieldGroupLabelSubDescriptor => SetBody::McaLabel(McaLabel {
                label_dictionary_id: self.req(P::McaLabelDictionaryId, PropertyValue::as_ul)?,
                tag_symbol: self.req(P::McaTagSymbol, |v| v.as_string().map(str::to_string))?,
                tag_name: self.string(P::McaTagName),
                link_id: self.opt(P::McaLinkId, PropertyValue::as_uid),
                channel_id: self.opt(P::McaChannelId, PropertyValue::as_u32),
                spoken_language: self.string(P::Rfc5646SpokenLanguage),
                soundfield_group_link_id: self.opt(P::SoundfieldGroupLinkId, PropertyValue::as_uid),
                group_of_soundfield_groups_link_ids: self
                    .opt(P::GroupOfSoundfieldGroupsLinkId, PropertyValue::as_uids)
                    .unwrap_or_default(),
                mga_metadata_section_link_id: self
                    .opt(P::MgaMetadataSectionLinkId, PropertyValue::as_uid),
                adm_audio_programme_id: self.string(P::AdmAudioProgrammeId),
            }),
        };

        Ok(MetadataSet {
            kind: self.kind,
            instance_uid,
            byte_offset: self.byte_offset,
            body,
        })
    }

    fn package(&self, is_source: bool) -> Result<Package, MxfError> {
        use PropertyId as P;

        Ok(Package {
            package_uid: self.req(P::PackageUid, PropertyValue::as_uid)?,
            name: self.string(P::PackageName),
            creation_date: self.opt(P::PackageCreationDate, PropertyValue::as_timestamp),
            modified_date: self.opt(P::PackageModifiedDate, PropertyValue::as_timestamp),
            tracks: self.refs(P::Tracks),
            descriptor: if is_source {
                Some(self.strong_ref(P::Descriptor)?)
            } else {
                None
            },
        })
    }

    fn file(&self) -> Result<FileDescriptor, MxfError> {
        use PropertyId as P;

        Ok(FileDescriptor {
            sub_descriptors: self.refs(P::SubDescriptors),
            linked_track_id: self.opt(P::LinkedTrackId, PropertyValue::as_u32),
            sample_rate: self.req(P::SampleRate, PropertyValue::as_rational)?,
            container_duration: self.opt(P::ContainerDuration, PropertyValue::as_i64),
            essence_container: self.req(P::EssenceContainer, PropertyValue::as_ul)?,
        })
    }

    fn picture(&self) -> Result<PictureDescriptor, MxfError> {
        use PropertyId as P;

        Ok(PictureDescriptor {
            file: self.file()?,
            frame_layout: self.opt(P::FrameLayout, PropertyValue::as_u8),
            stored_width: self.req(P::StoredWidth, PropertyValue::as_u32)?,
            stored_height: self.req(P::StoredHeight, PropertyValue::as_u32)?,
            display_width: self.opt(P::DisplayWidth, PropertyValue::as_u32),
            display_height: self.opt(P::DisplayHeight, PropertyValue::as_u32),
            aspect_ratio: self.opt(P::AspectRatio, PropertyValue::as_rational),
            video_line_map: self
                .opt(P::VideoLineMap, PropertyValue::as_i32s)
                .unwrap_or_default(),
            picture_compression: self.opt(P::PictureCompression, PropertyValue::as_ul),
            transfer_characteristic: self.opt(P::TransferCharacteristic, PropertyValue::as_ul),
            coding_equations: self.opt(P::CodingEquations, PropertyValue::as_ul),
            color_primaries: self.opt(P::ColorPrimaries, PropertyValue::as_ul),
        })
    }

    fn sound(&self) -> Result<SoundDescriptor, MxfError> {
        use PropertyId as P;

        Ok(SoundDescriptor {
            file: self.file()?,
            audio_sampling_rate: self.req(P::AudioSamplingRate, PropertyValue::as_rational)?,
            locked: self.opt(P::Locked, PropertyValue::as_bool),
            audio_ref_level: self.opt(P::AudioRefLevel, PropertyValue::as_i8),
            channel_count: self.req(P::ChannelCount, PropertyValue::as_u32)?,
            quantization_bits: self.req(P::QuantizationBits, PropertyValue::as_u32)?,
            sound_compression: self.opt(P::SoundCompression, PropertyValue::as_ul),
        })
    }
}

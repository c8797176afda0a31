//! The metadata set dictionary.
//!
//! Sets in the header partition are local sets whose keys look like
//! `060e2b34.02530101.0d010101.01XXYY00`. Byte 14 (`YY`) says which kind of set
//! it is. Byte 5 (the registry designator) and byte 7 (the version) vary in
//! the wild, so lookups ignore them.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::{properties::PropertyId, ul::Ul};

/// Compares set keys while ignoring byte 5 and byte 7.
pub const SET_KEY_MASK: u16 = 0b1111_1010_1111_1111;

/// All set keys share these bytes, apart from byte 13 and byte 14.
const SET_KEY_BASE: u128 = 0x060e2b34_02530101_0d010101_01000000;

use PropertyId as P;

const INTERCHANGE: &[PropertyId] = &[P::InstanceUid];

const PACKAGE: &[PropertyId] = &[
    P::PackageUid,
    P::PackageName,
    P::PackageCreationDate,
    P::PackageModifiedDate,
    P::Tracks,
];

const COMPONENT: &[PropertyId] = &[P::DataDefinition, P::Duration];

const FILE_DESCRIPTOR: &[PropertyId] = &[
    P::SubDescriptors,
    P::LinkedTrackId,
    P::SampleRate,
    P::ContainerDuration,
    P::EssenceContainer,
];

const PICTURE_DESCRIPTOR: &[PropertyId] = &[
    P::FrameLayout,
    P::StoredWidth,
    P::StoredHeight,
    P::DisplayWidth,
    P::DisplayHeight,
    P::AspectRatio,
    P::VideoLineMap,
    P::PictureCompression,
    P::TransferCharacteristic,
    P::CodingEquations,
    P::ColorPrimaries,
];

const SOUND_DESCRIPTOR: &[PropertyId] = &[
    P::AudioSamplingRate,
    P::Locked,
    P::AudioRefLevel,
    P::ChannelCount,
    P::QuantizationBits,
    P::SoundCompression,
];

const MCA_LABEL: &[PropertyId] = &[
    P::McaLabelDictionaryId,
    P::McaTagSymbol,
    P::McaTagName,
    P::McaLinkId,
    P::McaChannelId,
    P::Rfc5646SpokenLanguage,
];

/// Creates the [`SetKind`] enum.
///
/// Each set lists its fields as groups, so inherited properties are shared.
macro_rules! create_known_sets_enum {
    ($( $variant_ident:ident = $key_byte:expr => {
        name: $name:expr,
        fields: $fields:expr,
    }, )+) => {
        /// A list of all metadata sets the header partition model understands.
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
        pub enum SetKind {
            $( $variant_ident = $key_byte, )+
        }

        impl SetKind {
            /// Every known set.
            pub const ALL: &'static [SetKind] = &[ $( SetKind::$variant_ident, )+ ];

            /// The set's name in the registry.
            pub const fn name(&self) -> &'static str {
                match self {
                    $( SetKind::$variant_ident => $name, )+
                }
            }

            /// The groups of properties this set may carry.
            pub const fn field_groups(&self) -> &'static [&'static [PropertyId]] {
                match self {
                    $( SetKind::$variant_ident => $fields, )+
                }
            }
        }
    };
}

create_known_sets_enum!(
    Preface = 0x2f => {
        name: "Preface",
        fields: &[INTERCHANGE, &[
            P::LastModifiedDate,
            P::Version,
            P::ObjectModelVersion,
            P::PrimaryPackage,
            P::Identifications,
            P::ContentStorage,
            P::OperationalPattern,
            P::EssenceContainers,
            P::DmSchemes,
        ]],
    },
    Identification = 0x30 => {
        name: "Identification",
        fields: &[INTERCHANGE, &[
            P::ThisGenerationUid,
            P::CompanyName,
            P::ProductName,
            P::VersionString,
            P::ProductUid,
            P::ModificationDate,
        ]],
    },
    ContentStorage = 0x18 => {
        name: "ContentStorage",
        fields: &[INTERCHANGE, &[P::Packages, P::EssenceContainerData]],
    },
    EssenceContainerData = 0x23 => {
        name: "EssenceContainerData",
        fields: &[INTERCHANGE, &[P::LinkedPackageUid, P::IndexSid, P::BodySid]],
    },
    MaterialPackage = 0x36 => {
        name: "MaterialPackage",
        fields: &[INTERCHANGE, PACKAGE],
    },
    SourcePackage = 0x37 => {
        name: "SourcePackage",
        fields: &[INTERCHANGE, PACKAGE, &[P::Descriptor]],
    },
    TimelineTrack = 0x3b => {
        name: "TimelineTrack",
        fields: &[INTERCHANGE, &[
            P::TrackId,
            P::TrackNumber,
            P::TrackName,
            P::Sequence,
            P::EditRate,
            P::Origin,
        ]],
    },
    Sequence = 0x0f => {
        name: "Sequence",
        fields: &[INTERCHANGE, COMPONENT, &[P::StructuralComponents]],
    },
    SourceClip = 0x11 => {
        name: "SourceClip",
        fields: &[INTERCHANGE, COMPONENT, &[
            P::StartPosition,
            P::SourcePackageId,
            P::SourceTrackId,
        ]],
    },
    TimecodeComponent = 0x14 => {
        name: "TimecodeComponent",
        fields: &[INTERCHANGE, COMPONENT, &[
            P::RoundedTimecodeBase,
            P::StartTimecode,
            P::DropFrame,
        ]],
    },
    CdciPictureEssenceDescriptor = 0x28 => {
        name: "CDCIPictureEssenceDescriptor",
        fields: &[INTERCHANGE, FILE_DESCRIPTOR, PICTURE_DESCRIPTOR, &[
            P::ComponentDepth,
            P::HorizontalSubsampling,
            P::VerticalSubsampling,
            P::ColorSiting,
            P::BlackRefLevel,
            P::WhiteRefLevel,
            P::ColorRange,
        ]],
    },
    RgbaPictureEssenceDescriptor = 0x29 => {
        name: "RGBAPictureEssenceDescriptor",
        fields: &[INTERCHANGE, FILE_DESCRIPTOR, PICTURE_DESCRIPTOR, &[
            P::ComponentMaxRef,
            P::ComponentMinRef,
            P::PixelLayout,
        ]],
    },
    WaveAudioEssenceDescriptor = 0x48 => {
        name: "WaveAudioEssenceDescriptor",
        fields: &[INTERCHANGE, FILE_DESCRIPTOR, SOUND_DESCRIPTOR, &[
            P::BlockAlign,
            P::AverageBytesPerSecond,
            P::ChannelAssignment,
        ]],
    },
    Jpeg2000PictureSubDescriptor = 0x5a => {
        name: "JPEG2000PictureSubDescriptor",
        fields: &[INTERCHANGE, &[
            P::Rsiz,
            P::Xsiz,
            P::Ysiz,
            P::XOsiz,
            P::YOsiz,
            P::XTsiz,
            P::YTsiz,
            P::XTOsiz,
            P::YTOsiz,
            P::Csiz,
            P::PictureComponentSizing,
            P::CodingStyleDefault,
            P::QuantizationDefault,
            P::J2cLayout,
            P::J2kExtendedCapabilities,
        ]],
    },
    AudioChannelLabelSubDescriptor = 0x6b => {
        name: "AudioChannelLabelSubDescriptor",
        fields: &[INTERCHANGE, MCA_LABEL, &[P::SoundfieldGroupLinkId]],
    },
    SoundfieldGroupLabelSubDescriptor = 0x6c => {
        name: "SoundfieldGroupLabelSubDescriptor",
        fields: &[INTERCHANGE, MCA_LABEL, &[P::GroupOfSoundfieldGroupsLinkId]],
    },
    GroupOfSoundfieldGroupsLabelSubDescriptor = 0x6d => {
        name: "GroupOfSoundfieldGroupsLabelSubDescriptor",
        fields: &[INTERCHANGE, MCA_LABEL],
    },
    IabEssenceDescriptor = 0x7b => {
        name: "IABEssenceDescriptor",
        fields: &[INTERCHANGE, FILE_DESCRIPTOR, SOUND_DESCRIPTOR],
    },
    IabSoundfieldLabelSubDescriptor = 0x7c => {
        name: "IABSoundfieldLabelSubDescriptor",
        fields: &[INTERCHANGE, MCA_LABEL, &[P::GroupOfSoundfieldGroupsLinkId]],
    },
    MgaSoundEssenceDescriptor = 0x81 => {
        name: "MGASoundEssenceDescriptor",
        fields: &[INTERCHANGE, FILE_DESCRIPTOR, SOUND_DESCRIPTOR, &[
            P::MgaSoundEssenceBlockAlign,
            P::MgaSoundEssenceAverageBytesPerSecond,
        ]],
    },
    MgaSoundfieldGroupLabelSubDescriptor = 0x83 => {
        name: "MGASoundfieldGroupLabelSubDescriptor",
        fields: &[INTERCHANGE, MCA_LABEL, &[
            P::GroupOfSoundfieldGroupsLinkId,
            P::MgaMetadataSectionLinkId,
            P::AdmAudioProgrammeId,
        ]],
    },
);

/// Clears the bytes set lookups don't care about.
const fn normalise(key: &Ul) -> [u8; 16] {
    let mut bytes = key.0;
    bytes[5] = 0;
    bytes[7] = 0;
    bytes
}

static BY_KEY: LazyLock<FxHashMap<[u8; 16], SetKind>> = LazyLock::new(|| {
    SetKind::ALL
        .iter()
        .map(|kind| (normalise(&kind.key()), *kind))
        .collect()
});

impl SetKind {
    /// The set's key, as written by current encoders.
    ///
    /// ```
    /// use imf_validation_types::sets::SetKind;
    ///
    /// assert_eq!(
    ///     SetKind::Preface.key().to_string(),
    ///     "urn:smpte:ul:060e2b34.02530101.0d010101.01012f00"
    /// );
    /// ```
    pub const fn key(&self) -> Ul {
        let mut ul = Ul::from_u128(SET_KEY_BASE);
        ul.0[13] = 0x01;
        ul.0[14] = *self as u8;
        ul
    }

    /// Finds the kind of set a key names.
    ///
    /// Byte 5 and byte 7 are ignored.
    pub fn from_key(key: &Ul) -> Option<SetKind> {
        BY_KEY.get(&normalise(key)).copied()
    }

    /// Checks whether this set may carry `property`.
    pub fn accepts(&self, property: PropertyId) -> bool {
        self.field_groups()
            .iter()
            .any(|group| group.contains(&property))
    }

    /// Every property this set may carry, in table order.
    pub fn fields(&self) -> impl Iterator<Item = PropertyId> {
        self.field_groups().iter().flat_map(|g| g.iter().copied())
    }

    /// Whether this set is one of the top-level essence descriptors.
    pub const fn is_essence_descriptor(&self) -> bool {
        matches!(
            self,
            SetKind::CdciPictureEssenceDescriptor
                | SetKind::RgbaPictureEssenceDescriptor
                | SetKind::WaveAudioEssenceDescriptor
                | SetKind::IabEssenceDescriptor
                | SetKind::MgaSoundEssenceDescriptor
        )
    }

    /// Whether this set is a sub-descriptor.
    pub const fn is_sub_descriptor(&self) -> bool {
        matches!(
            self,
            SetKind::Jpeg2000PictureSubDescriptor
                | SetKind::AudioChannelLabelSubDescriptor
                | SetKind::SoundfieldGroupLabelSubDescriptor
                | SetKind::GroupOfSoundfieldGroupsLabelSubDescriptor
                | SetKind::IabSoundfieldLabelSubDescriptor
                | SetKind::MgaSoundfieldGroupLabelSubDescriptor
        )
    }
}

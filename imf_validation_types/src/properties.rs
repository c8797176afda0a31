//! The property (item) dictionary.
//!
//! # `properties`
//!
//! Each metadata set is a list of items. On disk, an item is just a 2-byte
//! local tag and some bytes - the primer pack turns that tag into an item UL,
//! and this table turns the item UL into a [`PropertyId`] that knows how its
//! bytes should be decoded.
//!
//! ## For contributors
//!
//! <div class="warning">
//! The rest of this documentation is only useful when adding new properties.
//! </div>
//!
//! To support a new item, add a row to the `create_known_properties_enum!`
//! call below, then list it in the `fields` of each set that carries it
//! (see [`crate::sets`]). The version byte (byte 7) of the UL doesn't matter;
//! lookups ignore it.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::ul::Ul;

/// How the characters of a string property are encoded.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum Charset {
    /// The MXF default for strings.
    Utf16Be,
    Utf8,
    /// ISO 7-bit, used by RFC 5646 language tags.
    Ascii,
}

/// The type of each element inside a batch or array.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum ElementKind {
    U8,
    U16,
    U32,
    I32,
    Ul,
    StrongRef,
    Uid,
    /// A fixed-size record of raw bytes, like J2K component sizing (3 bytes).
    Record(u32),
}

impl ElementKind {
    /// The size of one element on disk, in bytes.
    pub const fn size_bytes(&self) -> u32 {
        match self {
            ElementKind::U8 => 1,
            ElementKind::U16 => 2,
            ElementKind::U32 | ElementKind::I32 => 4,
            ElementKind::Ul | ElementKind::StrongRef | ElementKind::Uid => 16,
            ElementKind::Record(size) => *size,
        }
    }
}

/// The declared semantic type of a property.
///
/// The populator dispatches on this, never on whatever the bytes look like.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum DecodeKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Bool,
    F32,
    Rational,
    Timestamp,
    Ul,
    Uid,
    Umid,
    String(Charset),
    Bytes,
    StrongRef,
    WeakRef,
    /// An unordered collection with a count + element size header.
    Batch(ElementKind),
    /// An ordered collection with a count + element size header.
    Array(ElementKind),
}

impl DecodeKind {
    /// The exact size of a value of this kind, if it has one.
    ///
    /// Strings, byte blobs, and collections are variable.
    pub const fn fixed_size(&self) -> Option<u64> {
        Some(match self {
            DecodeKind::U8 | DecodeKind::I8 | DecodeKind::Bool => 1,
            DecodeKind::U16 | DecodeKind::I16 => 2,
            DecodeKind::U32 | DecodeKind::I32 | DecodeKind::F32 => 4,
            DecodeKind::U64 | DecodeKind::I64 | DecodeKind::Rational => 8,
            DecodeKind::Timestamp => 8,
            DecodeKind::Ul | DecodeKind::Uid | DecodeKind::StrongRef | DecodeKind::WeakRef => 16,
            DecodeKind::Umid => 32,
            DecodeKind::String(_)
            | DecodeKind::Bytes
            | DecodeKind::Batch(_)
            | DecodeKind::Array(_) => return None,
        })
    }
}

/// Creates the [`PropertyId`] enum and its lookup table.
macro_rules! create_known_properties_enum {
    ($( $variant_ident:ident = $variant_ul:expr => {
        name: $name:expr,
        kind: $kind:expr,
    }, )+) => {
        /// A list of all known metadata set properties.
        #[non_exhaustive]
        #[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
        pub enum PropertyId {
            $( $variant_ident, )+
        }

        impl PropertyId {
            /// Every known property.
            pub const ALL: &'static [PropertyId] = &[ $( PropertyId::$variant_ident, )+ ];

            /// The item's UL.
            ///
            /// ```
            /// use imf_validation_types::properties::PropertyId;
            ///
            /// assert_eq!(
            ///     PropertyId::InstanceUid.ul().to_string(),
            ///     "urn:smpte:ul:060e2b34.01010101.01011502.00000000"
            /// );
            /// ```
            pub const fn ul(&self) -> Ul {
                match self {
                    $( PropertyId::$variant_ident => Ul::from_u128($variant_ul), )+
                }
            }

            /// The item's name in the registry.
            pub const fn name(&self) -> &'static str {
                match self {
                    $( PropertyId::$variant_ident => $name, )+
                }
            }

            /// How the item's value should be decoded.
            pub const fn kind(&self) -> DecodeKind {
                match self {
                    $( PropertyId::$variant_ident => $kind, )+
                }
            }
        }
    };
}

use Charset as Cs;
use DecodeKind as K;
use ElementKind as E;

create_known_properties_enum!(
    //
    // interchange object
    //
    InstanceUid = 0x060e2b34_01010101_01011502_00000000 => {
        name: "InstanceUID",
        kind: K::Uid,
    },

    //
    // preface
    //
    LastModifiedDate = 0x060e2b34_01010102_07020110_02040000 => {
        name: "LastModifiedDate",
        kind: K::Timestamp,
    },
    Version = 0x060e2b34_01010102_03010201_05000000 => {
        name: "Version",
        kind: K::U16,
    },
    ObjectModelVersion = 0x060e2b34_01010102_03010201_04000000 => {
        name: "ObjectModelVersion",
        kind: K::U32,
    },
    PrimaryPackage = 0x060e2b34_01010104_06010104_01080000 => {
        name: "PrimaryPackage",
        kind: K::WeakRef,
    },
    Identifications = 0x060e2b34_01010102_06010104_06040000 => {
        name: "Identifications",
        kind: K::Array(E::StrongRef),
    },
    ContentStorage = 0x060e2b34_01010102_06010104_02010000 => {
        name: "ContentStorage",
        kind: K::StrongRef,
    },
    OperationalPattern = 0x060e2b34_01010105_01020203_00000000 => {
        name: "OperationalPattern",
        kind: K::Ul,
    },
    EssenceContainers = 0x060e2b34_01010105_01020210_02010000 => {
        name: "EssenceContainers",
        kind: K::Batch(E::Ul),
    },
    DmSchemes = 0x060e2b34_01010105_01020210_02020000 => {
        name: "DMSchemes",
        kind: K::Batch(E::Ul),
    },

    //
    // identification
    //
    ThisGenerationUid = 0x060e2b34_01010102_05200701_01000000 => {
        name: "ThisGenerationUID",
        kind: K::Uid,
    },
    CompanyName = 0x060e2b34_01010102_05200701_02010000 => {
        name: "CompanyName",
        kind: K::String(Cs::Utf16Be),
    },
    ProductName = 0x060e2b34_01010102_05200701_03010000 => {
        name: "ProductName",
        kind: K::String(Cs::Utf16Be),
    },
    VersionString = 0x060e2b34_01010102_05200701_05010000 => {
        name: "VersionString",
        kind: K::String(Cs::Utf16Be),
    },
    ProductUid = 0x060e2b34_01010102_05200701_07000000 => {
        name: "ProductUID",
        kind: K::Uid,
    },
    ModificationDate = 0x060e2b34_01010102_07020110_02030000 => {
        name: "ModificationDate",
        kind: K::Timestamp,
    },

    //
    // content storage
    //
    Packages = 0x060e2b34_01010102_06010104_05010000 => {
        name: "Packages",
        kind: K::Batch(E::StrongRef),
    },
    EssenceContainerData = 0x060e2b34_01010102_06010104_05020000 => {
        name: "EssenceContainerData",
        kind: K::Batch(E::StrongRef),
    },

    //
    // essence container data
    //
    LinkedPackageUid = 0x060e2b34_01010102_06010106_01000000 => {
        name: "LinkedPackageUID",
        kind: K::Umid,
    },
    IndexSid = 0x060e2b34_01010104_01030405_00000000 => {
        name: "IndexSID",
        kind: K::U32,
    },
    BodySid = 0x060e2b34_01010104_01030404_00000000 => {
        name: "BodySID",
        kind: K::U32,
    },

    //
    // packages
    //
    PackageUid = 0x060e2b34_01010101_01011510_00000000 => {
        name: "PackageUID",
        kind: K::Umid,
    },
    PackageName = 0x060e2b34_01010101_01030302_01000000 => {
        name: "PackageName",
        kind: K::String(Cs::Utf16Be),
    },
    PackageCreationDate = 0x060e2b34_01010102_07020110_01030000 => {
        name: "PackageCreationDate",
        kind: K::Timestamp,
    },
    PackageModifiedDate = 0x060e2b34_01010102_07020110_02050000 => {
        name: "PackageModifiedDate",
        kind: K::Timestamp,
    },
    Tracks = 0x060e2b34_01010102_06010104_06050000 => {
        name: "Tracks",
        kind: K::Array(E::StrongRef),
    },
    Descriptor = 0x060e2b34_01010102_06010104_02030000 => {
        name: "Descriptor",
        kind: K::StrongRef,
    },

    //
    // tracks
    //
    TrackId = 0x060e2b34_01010102_01070101_00000000 => {
        name: "TrackID",
        kind: K::U32,
    },
    TrackNumber = 0x060e2b34_01010102_01040103_00000000 => {
        name: "TrackNumber",
        kind: K::U32,
    },
    TrackName = 0x060e2b34_01010102_01070102_01000000 => {
        name: "TrackName",
        kind: K::String(Cs::Utf16Be),
    },
    Sequence = 0x060e2b34_01010102_06010104_02040000 => {
        name: "Sequence",
        kind: K::StrongRef,
    },
    EditRate = 0x060e2b34_01010102_05300405_00000000 => {
        name: "EditRate",
        kind: K::Rational,
    },
    Origin = 0x060e2b34_01010102_07020103_01030000 => {
        name: "Origin",
        kind: K::I64,
    },

    //
    // structural components
    //
    DataDefinition = 0x060e2b34_01010102_04070100_00000000 => {
        name: "DataDefinition",
        kind: K::Ul,
    },
    Duration = 0x060e2b34_01010102_07020201_01000000 => {
        name: "Duration",
        kind: K::I64,
    },
    StructuralComponents = 0x060e2b34_01010102_06010104_06090000 => {
        name: "StructuralComponents",
        kind: K::Array(E::StrongRef),
    },
    StartPosition = 0x060e2b34_01010102_07020103_01040000 => {
        name: "StartPosition",
        kind: K::I64,
    },
    SourcePackageId = 0x060e2b34_01010102_06010103_01000000 => {
        name: "SourcePackageID",
        kind: K::Umid,
    },
    SourceTrackId = 0x060e2b34_01010102_06010103_02000000 => {
        name: "SourceTrackID",
        kind: K::U32,
    },
    RoundedTimecodeBase = 0x060e2b34_01010102_04040101_01060000 => {
        name: "RoundedTimecodeBase",
        kind: K::U16,
    },
    StartTimecode = 0x060e2b34_01010102_07020103_01050000 => {
        name: "StartTimecode",
        kind: K::I64,
    },
    DropFrame = 0x060e2b34_01010101_04040101_05000000 => {
        name: "DropFrame",
        kind: K::Bool,
    },

    //
    // descriptors
    //
    SubDescriptors = 0x060e2b34_01010109_06010104_06100000 => {
        name: "SubDescriptors",
        kind: K::Array(E::StrongRef),
    },
    LinkedTrackId = 0x060e2b34_01010105_06010103_05000000 => {
        name: "LinkedTrackID",
        kind: K::U32,
    },
    SampleRate = 0x060e2b34_01010101_04060101_00000000 => {
        name: "SampleRate",
        kind: K::Rational,
    },
    ContainerDuration = 0x060e2b34_01010101_04060102_00000000 => {
        name: "ContainerDuration",
        kind: K::I64,
    },
    EssenceContainer = 0x060e2b34_01010102_06010104_01020000 => {
        name: "EssenceContainer",
        kind: K::Ul,
    },

    //
    // picture descriptors
    //
    FrameLayout = 0x060e2b34_01010101_04010301_04000000 => {
        name: "FrameLayout",
        kind: K::U8,
    },
    StoredWidth = 0x060e2b34_01010101_04010502_02000000 => {
        name: "StoredWidth",
        kind: K::U32,
    },
    StoredHeight = 0x060e2b34_01010101_04010502_01000000 => {
        name: "StoredHeight",
        kind: K::U32,
    },
    DisplayWidth = 0x060e2b34_01010101_04010501_0c000000 => {
        name: "DisplayWidth",
        kind: K::U32,
    },
    DisplayHeight = 0x060e2b34_01010101_04010501_0b000000 => {
        name: "DisplayHeight",
        kind: K::U32,
    },
    AspectRatio = 0x060e2b34_01010101_04010101_01000000 => {
        name: "AspectRatio",
        kind: K::Rational,
    },
    VideoLineMap = 0x060e2b34_01010102_04010302_05000000 => {
        name: "VideoLineMap",
        kind: K::Array(E::I32),
    },
    PictureCompression = 0x060e2b34_01010102_04010601_00000000 => {
        name: "PictureCompression",
        kind: K::Ul,
    },
    TransferCharacteristic = 0x060e2b34_01010102_04010201_01010200 => {
        name: "TransferCharacteristic",
        kind: K::Ul,
    },
    CodingEquations = 0x060e2b34_01010102_04010201_01030100 => {
        name: "CodingEquations",
        kind: K::Ul,
    },
    ColorPrimaries = 0x060e2b34_01010109_04010201_01060100 => {
        name: "ColorPrimaries",
        kind: K::Ul,
    },
    ComponentDepth = 0x060e2b34_01010102_04010503_0a000000 => {
        name: "ComponentDepth",
        kind: K::U32,
    },
    HorizontalSubsampling = 0x060e2b34_01010101_04010501_05000000 => {
        name: "HorizontalSubsampling",
        kind: K::U32,
    },
    VerticalSubsampling = 0x060e2b34_01010102_04010501_10000000 => {
        name: "VerticalSubsampling",
        kind: K::U32,
    },
    ColorSiting = 0x060e2b34_01010101_04010501_06000000 => {
        name: "ColorSiting",
        kind: K::U8,
    },
    BlackRefLevel = 0x060e2b34_01010101_04010503_03000000 => {
        name: "BlackRefLevel",
        kind: K::U32,
    },
    WhiteRefLevel = 0x060e2b34_01010101_04010503_04000000 => {
        name: "WhiteRefLevel",
        kind: K::U32,
    },
    ColorRange = 0x060e2b34_01010102_04010503_05000000 => {
        name: "ColorRange",
        kind: K::U32,
    },
    ComponentMaxRef = 0x060e2b34_01010105_04010503_0b000000 => {
        name: "ComponentMaxRef",
        kind: K::U32,
    },
    ComponentMinRef = 0x060e2b34_01010105_04010503_0c000000 => {
        name: "ComponentMinRef",
        kind: K::U32,
    },
    PixelLayout = 0x060e2b34_01010102_04010503_06000000 => {
        name: "PixelLayout",
        kind: K::Bytes,
    },

    //
    // sound descriptors
    //
    AudioSamplingRate = 0x060e2b34_01010105_04020301_01010000 => {
        name: "AudioSamplingRate",
        kind: K::Rational,
    },
    Locked = 0x060e2b34_01010104_04020301_04000000 => {
        name: "Locked",
        kind: K::Bool,
    },
    AudioRefLevel = 0x060e2b34_01010101_04020101_03000000 => {
        name: "AudioRefLevel",
        kind: K::I8,
    },
    ChannelCount = 0x060e2b34_01010105_04020101_04000000 => {
        name: "ChannelCount",
        kind: K::U32,
    },
    QuantizationBits = 0x060e2b34_01010104_04020303_04000000 => {
        name: "QuantizationBits",
        kind: K::U32,
    },
    SoundCompression = 0x060e2b34_01010102_04020402_00000000 => {
        name: "SoundCompression",
        kind: K::Ul,
    },
    BlockAlign = 0x060e2b34_01010105_04020302_01000000 => {
        name: "BlockAlign",
        kind: K::U16,
    },
    AverageBytesPerSecond = 0x060e2b34_01010105_04020303_05000000 => {
        name: "AverageBytesPerSecond",
        kind: K::U32,
    },
    ChannelAssignment = 0x060e2b34_01010107_04020101_05000000 => {
        name: "ChannelAssignment",
        kind: K::Ul,
    },
    MgaSoundEssenceBlockAlign = 0x060e2b34_0101010e_04020501_01000000 => {
        name: "MGASoundEssenceBlockAlign",
        kind: K::U16,
    },
    MgaSoundEssenceAverageBytesPerSecond = 0x060e2b34_0101010e_04020501_02000000 => {
        name: "MGASoundEssenceAverageBytesPerSecond",
        kind: K::U32,
    },

    //
    // JPEG 2000
    //
    Rsiz = 0x060e2b34_0101010a_04010603_01000000 => {
        name: "Rsize",
        kind: K::U16,
    },
    Xsiz = 0x060e2b34_0101010a_04010603_02000000 => {
        name: "Xsize",
        kind: K::U32,
    },
    Ysiz = 0x060e2b34_0101010a_04010603_03000000 => {
        name: "Ysize",
        kind: K::U32,
    },
    XOsiz = 0x060e2b34_0101010a_04010603_04000000 => {
        name: "XOsize",
        kind: K::U32,
    },
    YOsiz = 0x060e2b34_0101010a_04010603_05000000 => {
        name: "YOsize",
        kind: K::U32,
    },
    XTsiz = 0x060e2b34_0101010a_04010603_06000000 => {
        name: "XTsize",
        kind: K::U32,
    },
    YTsiz = 0x060e2b34_0101010a_04010603_07000000 => {
        name: "YTsize",
        kind: K::U32,
    },
    XTOsiz = 0x060e2b34_0101010a_04010603_08000000 => {
        name: "XTOsize",
        kind: K::U32,
    },
    YTOsiz = 0x060e2b34_0101010a_04010603_09000000 => {
        name: "YTOsize",
        kind: K::U32,
    },
    Csiz = 0x060e2b34_0101010a_04010603_0a000000 => {
        name: "Csize",
        kind: K::U16,
    },
    PictureComponentSizing = 0x060e2b34_0101010a_04010603_0b000000 => {
        name: "PictureComponentSizing",
        kind: K::Array(E::Record(3)),
    },
    CodingStyleDefault = 0x060e2b34_0101010a_04010603_0c000000 => {
        name: "CodingStyleDefault",
        kind: K::Bytes,
    },
    QuantizationDefault = 0x060e2b34_0101010a_04010603_0d000000 => {
        name: "QuantizationDefault",
        kind: K::Bytes,
    },
    J2cLayout = 0x060e2b34_0101010e_04010603_0e000000 => {
        name: "J2CLayout",
        kind: K::Bytes,
    },
    J2kExtendedCapabilities = 0x060e2b34_0101010e_04010603_0f000000 => {
        name: "J2KExtendedCapabilities",
        kind: K::Bytes,
    },

    //
    // multichannel audio labels
    //
    McaLabelDictionaryId = 0x060e2b34_0101010e_01030701_01000000 => {
        name: "MCALabelDictionaryID",
        kind: K::Ul,
    },
    McaTagSymbol = 0x060e2b34_0101010e_01030701_02000000 => {
        name: "MCATagSymbol",
        kind: K::String(Cs::Utf16Be),
    },
    McaTagName = 0x060e2b34_0101010e_01030701_03000000 => {
        name: "MCATagName",
        kind: K::String(Cs::Utf16Be),
    },
    GroupOfSoundfieldGroupsLinkId = 0x060e2b34_0101010e_01030701_04000000 => {
        name: "GroupOfSoundfieldGroupsLinkID",
        kind: K::Batch(E::Uid),
    },
    McaLinkId = 0x060e2b34_0101010e_01030701_05000000 => {
        name: "MCALinkID",
        kind: K::Uid,
    },
    SoundfieldGroupLinkId = 0x060e2b34_0101010e_01030701_06000000 => {
        name: "SoundfieldGroupLinkID",
        kind: K::Uid,
    },
    McaChannelId = 0x060e2b34_0101010e_01030104_0a000000 => {
        name: "MCAChannelID",
        kind: K::U32,
    },
    Rfc5646SpokenLanguage = 0x060e2b34_0101010d_03010102_03150000 => {
        name: "RFC5646SpokenLanguage",
        kind: K::String(Cs::Ascii),
    },
    MgaMetadataSectionLinkId = 0x060e2b34_0101010e_04020502_01000000 => {
        name: "MGAMetadataSectionLinkID",
        kind: K::Uid,
    },
    AdmAudioProgrammeId = 0x060e2b34_0101010e_04020502_02000000 => {
        name: "ADMAudioProgrammeID",
        kind: K::String(Cs::Utf16Be),
    },
);

/// Maps version-less item ULs to their properties.
static BY_UL: LazyLock<FxHashMap<Ul, PropertyId>> = LazyLock::new(|| {
    PropertyId::ALL
        .iter()
        .map(|id| (id.ul().without_version(), *id))
        .collect()
});

impl PropertyId {
    /// Finds the property an item UL names, ignoring its version byte.
    ///
    /// ```
    /// use imf_validation_types::{properties::PropertyId, ul::Ul};
    ///
    /// let mut ul = PropertyId::EditRate.ul();
    /// ul.0[7] = 0x07;
    /// assert_eq!(PropertyId::from_ul(&ul), Some(PropertyId::EditRate));
    /// ```
    pub fn from_ul(ul: &Ul) -> Option<PropertyId> {
        BY_UL.get(&ul.without_version()).copied()
    }
}

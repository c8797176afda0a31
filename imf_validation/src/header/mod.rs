//! The header partition's metadata.
//!
//! # `header`
//!
//! The header partition holds the primer pack and a flat list of local sets.
//! Sets point at each other through instance UIDs, forming a graph rooted at
//! the Preface:
//!
//! ```text
//! Preface
//! └── ContentStorage
//!     ├── Packages (Material, Source)
//!     │   └── Tracks
//!     │       └── Sequence
//!     │           └── SourceClips / TimecodeComponents
//!     │   └── Descriptor (source packages only)
//!     │       └── SubDescriptors
//!     └── EssenceContainerData
//! ```
//!
//! Every set lives in one arena, and references hold arena indices once
//! parsing is done.

use rustc_hash::FxHashMap;
use winnow::{Parser as _, binary::be_u16, error::EmptyError, token::take};

use imf_validation_types::{
    properties::PropertyId,
    sets::SetKind,
    ul::MxfUid,
};

use crate::{
    error::MxfError,
    error_log::{ErrorCode, ErrorLevel, ErrorLog},
    klv::KlvPacket,
    partition::PartitionPack,
    populate::populate,
    provider::{ResourceByteRangeProvider, read_len},
};

pub mod objects;
pub mod primer;

use objects::{
    ContentStorage, EssenceContainerData, Identification, MetadataSet, MxfDataDefinition, Package,
    Preface, RawSet, Sequence, SetIndex, SourceClip, StrongRef, TimelineTrack,
};
use primer::PrimerPack;

/// A fully-resolved header partition.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderPartition {
    /// The partition pack the header partition starts with, if the parsed
    /// range included it.
    partition_pack: Option<PartitionPack>,
    primer: PrimerPack,
    sets: Vec<MetadataSet>,
    by_uid: FxHashMap<MxfUid, SetIndex>,
    preface: SetIndex,
}

impl HeaderPartition {
    /// Reads and parses `length` bytes starting at `start`.
    pub fn from_provider(
        provider: &(impl ResourceByteRangeProvider + ?Sized),
        start: u64,
        length: u64,
        log: &mut ErrorLog,
    ) -> Result<HeaderPartition, MxfError> {
        let bytes = read_len(provider, start, length)?;
        HeaderPartition::parse(&bytes, start, log)
    }

    /// Parses a header partition out of `bytes`.
    ///
    /// `byte_offset` is where `bytes` starts in the resource. The bytes may
    /// start with the header partition pack, or directly with the primer.
    ///
    /// Unresolved optional references are logged as warnings. Unresolved
    /// required ones are logged as FATAL, then returned as an error.
    pub fn parse(
        bytes: &[u8],
        byte_offset: u64,
        log: &mut ErrorLog,
    ) -> Result<HeaderPartition, MxfError> {
        let mut input = bytes;
        let mut partition_pack = None;
        let mut primer: Option<PrimerPack> = None;
        let mut raw_sets = Vec::new();

        while !input.is_empty() {
            let offset = byte_offset + (bytes.len() - input.len()) as u64;
            let packet = KlvPacket::parse(&mut input, offset)?;
            let header = &packet.header;

            if header.is_fill_item() {
                log::trace!("Skipping fill item at `{offset}`.");
                continue;
            }

            if header.is_partition_pack() {
                if partition_pack.is_none() && primer.is_none() {
                    partition_pack = Some(PartitionPack::from_packet(&packet)?);
                } else {
                    log::warn!("Ignoring extra partition pack at `{offset}`.");
                }
                continue;
            }

            if header.is_primer_pack() {
                if primer.is_some() {
                    log::warn!("Ignoring second primer pack at `{offset}`.");
                } else {
                    primer = Some(PrimerPack::parse(packet.value)?);
                }
                continue;
            }

            if header.is_phdr_metadata() || header.is_generic_stream_data() {
                log::trace!("Skipping PHDR or generic stream data at `{offset}`.");
                continue;
            }

            if header.is_index_table_segment() {
                log::debug!("Skipping index table segment at `{offset}`.");
                continue;
            }

            if !header.key.is_local_set_with_two_byte_tags() {
                log::trace!("Skipping non-metadata packet `{}` at `{offset}`.", header.key);
                continue;
            }

            let Some(kind) = SetKind::from_key(&header.key) else {
                log::warn!("Skipping unknown local set `{}` at `{offset}`.", header.key);
                continue;
            };

            let Some(primer) = primer.as_ref() else {
                log::error!("Found a `{}` set before any primer pack.", kind.name());
                return Err(MxfError::MissingPrimerPack);
            };

            raw_sets.push(parse_local_set(kind, packet.value, offset, primer)?);
        }

        let primer = primer.ok_or_else(|| {
            log::error!("The header partition has no primer pack.");
            MxfError::MissingPrimerPack
        })?;

        // type every set, then index them by instance UID
        let mut sets: Vec<MetadataSet> = raw_sets
            .into_iter()
            .map(RawSet::into_set)
            .collect::<Result<_, _>>()?;

        let mut by_uid = FxHashMap::default();
        for (i, set) in sets.iter().enumerate() {
            if by_uid.insert(set.instance_uid, SetIndex(i)).is_some() {
                log::error!("Instance UID `{}` is used twice.", set.instance_uid);
                return Err(MxfError::DuplicateInstanceUid(set.instance_uid));
            }
        }

        let mut prefaces = sets
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == SetKind::Preface)
            .map(|(i, _)| SetIndex(i));
        let preface = match (prefaces.next(), prefaces.next()) {
            (Some(p), None) => p,
            (None, _) => {
                log::error!("The header partition has no Preface.");
                return Err(MxfError::MissingPreface);
            }
            (Some(_), Some(_)) => {
                log::error!("The header partition has more than one Preface.");
                return Err(MxfError::DuplicatePreface);
            }
        };

        resolve_references(&mut sets, &by_uid, log)?;

        log::debug!("Parsed header partition with `{}` sets.", sets.len());
        Ok(HeaderPartition {
            partition_pack,
            primer,
            sets,
            by_uid,
            preface,
        })
    }

    pub fn partition_pack(&self) -> Option<&PartitionPack> {
        self.partition_pack.as_ref()
    }

    pub fn primer(&self) -> &PrimerPack {
        &self.primer
    }

    /// Every set, in file order.
    pub fn sets(&self) -> &[MetadataSet] {
        &self.sets
    }

    pub fn set(&self, index: SetIndex) -> Option<&MetadataSet> {
        self.sets.get(index.0)
    }

    /// Finds a set by its instance UID.
    pub fn by_instance_uid(&self, uid: &MxfUid) -> Option<&MetadataSet> {
        self.by_uid.get(uid).and_then(|i| self.set(*i))
    }

    /// Follows a resolved reference.
    pub fn get(&self, reference: &StrongRef) -> Option<&MetadataSet> {
        reference.target.and_then(|i| self.set(i))
    }

    /// All sets of one kind.
    pub fn sets_of(&self, kind: SetKind) -> impl Iterator<Item = &MetadataSet> {
        self.sets.iter().filter(move |s| s.kind == kind)
    }

    pub fn preface_set(&self) -> &MetadataSet {
        &self.sets[self.preface.0]
    }

    pub fn preface(&self) -> Option<&Preface> {
        self.preface_set().as_preface()
    }

    pub fn identifications(&self) -> Vec<&Identification> {
        self.preface()
            .map(|p| {
                p.identifications
                    .iter()
                    .filter_map(|r| self.get(r))
                    .filter_map(MetadataSet::as_identification)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The ContentStorage the Preface points at.
    pub fn content_storage(&self) -> Option<&ContentStorage> {
        self.preface()
            .and_then(|p| self.get(&p.content_storage))
            .and_then(MetadataSet::as_content_storage)
    }

    /// Every package set in the partition.
    pub fn material_packages(&self) -> Vec<&Package> {
        self.sets_of(SetKind::MaterialPackage)
            .filter_map(MetadataSet::as_package)
            .collect()
    }

    pub fn source_packages(&self) -> Vec<&Package> {
        self.sets_of(SetKind::SourcePackage)
            .filter_map(MetadataSet::as_package)
            .collect()
    }

    /// Every EssenceContainerData set in the partition.
    pub fn essence_container_data(&self) -> Vec<&EssenceContainerData> {
        self.sets_of(SetKind::EssenceContainerData)
            .filter_map(MetadataSet::as_essence_container_data)
            .collect()
    }

    /// Finds a package by its UMID.
    pub fn package_by_uid(&self, package_uid: &MxfUid) -> Option<&MetadataSet> {
        self.sets
            .iter()
            .find(|s| s.as_package().is_some_and(|p| p.package_uid == *package_uid))
    }

    /// The top-level file package: the source package the (first)
    /// EssenceContainerData links to.
    pub fn top_level_file_package_set(&self) -> Option<&MetadataSet> {
        let linked = self.essence_container_data().first()?.linked_package_uid;
        self.sets_of(SetKind::SourcePackage)
            .find(|s| s.as_package().is_some_and(|p| p.package_uid == linked))
    }

    pub fn top_level_file_package(&self) -> Option<&Package> {
        self.top_level_file_package_set()
            .and_then(MetadataSet::as_package)
    }

    pub fn tracks(&self, package: &Package) -> Vec<&TimelineTrack> {
        package
            .tracks
            .iter()
            .filter_map(|r| self.get(r))
            .filter_map(MetadataSet::as_track)
            .collect()
    }

    pub fn sequence(&self, track: &TimelineTrack) -> Option<&Sequence> {
        self.get(&track.sequence).and_then(MetadataSet::as_sequence)
    }

    /// The track's essence kind, from its sequence.
    pub fn track_data_kind(&self, track: &TimelineTrack) -> MxfDataDefinition {
        self.sequence(track)
            .map(Sequence::data_kind)
            .unwrap_or(MxfDataDefinition::Other)
    }

    pub fn source_clips(&self, sequence: &Sequence) -> Vec<&SourceClip> {
        sequence
            .structural_components
            .iter()
            .filter_map(|r| self.get(r))
            .filter_map(MetadataSet::as_source_clip)
            .collect()
    }

    /// A source package's essence descriptor.
    pub fn descriptor(&self, package: &Package) -> Option<&MetadataSet> {
        package.descriptor.as_ref().and_then(|r| self.get(r))
    }

    /// A descriptor's resolved sub-descriptors.
    pub fn sub_descriptors(&self, descriptor: &MetadataSet) -> Vec<&MetadataSet> {
        descriptor
            .as_file_descriptor()
            .map(|f| f.sub_descriptors.iter().filter_map(|r| self.get(r)).collect())
            .unwrap_or_default()
    }

    /// The essence descriptor of the top-level file package.
    pub fn top_level_descriptor(&self) -> Option<&MetadataSet> {
        self.top_level_file_package()
            .and_then(|p| self.descriptor(p))
    }
}

/// Decodes a local set's items: a 2-byte tag, a 2-byte length, then the value.
fn parse_local_set(
    kind: SetKind,
    mut value: &[u8],
    byte_offset: u64,
    primer: &PrimerPack,
) -> Result<RawSet, MxfError> {
    let input = &mut value;
    let malformed = |_: EmptyError| {
        log::error!("`{}` set at `{byte_offset}` ends mid-item.", kind.name());
        MxfError::MalformedLocalSet {
            offset: byte_offset,
        }
    };

    let mut values = FxHashMap::default();
    while !input.is_empty() {
        let tag: u16 = be_u16.parse_next(input).map_err(malformed)?;
        let len: u16 = be_u16.parse_next(input).map_err(malformed)?;

        let Some(ul) = primer.get(tag) else {
            log::warn!(
                "Local tag `0x{tag:04x}` in `{}` isn't in the primer. Skipping.",
                kind.name()
            );
            take(len).void().parse_next(input).map_err(malformed)?;
            continue;
        };

        let property = match PropertyId::from_ul(ul) {
            Some(p) if kind.accepts(p) => p,
            Some(p) => {
                log::warn!("`{}` doesn't belong in `{}`. Skipping.", p.name(), kind.name());
                take(len).void().parse_next(input).map_err(malformed)?;
                continue;
            }
            None => {
                log::trace!("Skipping unknown item `{ul}` in `{}`.", kind.name());
                take(len).void().parse_next(input).map_err(malformed)?;
                continue;
            }
        };

        let decoded = populate(input, len as u64, property.kind()).map_err(|error| {
            log::error!(
                "Failed to decode `{}` in `{}` at `{byte_offset}`.",
                property.name(),
                kind.name()
            );
            MxfError::Populate {
                set: kind,
                property,
                error,
            }
        })?;

        if values.insert(property, decoded).is_some() {
            log::warn!("`{}` appears twice in `{}`. Keeping the last.", property.name(), kind.name());
        }
    }

    log::trace!("Decoded `{}` with `{}` properties.", kind.name(), values.len());
    Ok(RawSet {
        kind,
        byte_offset,
        values,
    })
}

/// Points every reference at its target set.
fn resolve_references(
    sets: &mut [MetadataSet],
    by_uid: &FxHashMap<MxfUid, SetIndex>,
    log: &mut ErrorLog,
) -> Result<(), MxfError> {
    let kinds: Vec<SetKind> = sets.iter().map(|s| s.kind).collect();
    let mut first_failure = None;

    for set in sets.iter_mut() {
        let from = set.kind;
        for slot in set.references_mut() {
            let target = by_uid
                .get(&slot.reference.uid)
                .copied()
                .filter(|i| kinds.get(i.0).is_some_and(|k| (slot.accepts)(k)));

            match (target, slot.required) {
                (Some(i), _) => slot.reference.target = Some(i),
                (None, true) => {
                    log.add_error(
                        ErrorCode::ImfEssenceComponentError,
                        ErrorLevel::Fatal,
                        format!(
                            "`{}.{}` refers to `{}`, which doesn't resolve to a compatible set.",
                            from.name(),
                            slot.property.name(),
                            slot.reference.uid
                        ),
                    );
                    first_failure.get_or_insert(MxfError::UnresolvedReference {
                        from,
                        property: slot.property,
                        target: slot.reference.uid,
                    });
                }
                (None, false) => log.add_error(
                    ErrorCode::ImfEssenceMetadataError,
                    ErrorLevel::Warning,
                    format!(
                        "`{}.{}` refers to `{}`, which isn't in this header partition.",
                        from.name(),
                        slot.property.name(),
                        slot.reference.uid
                    ),
                ),
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::HeaderPartition;
    use crate::{
        error::MxfError,
        error_log::{ErrorLevel, ErrorLog},
        header::objects::MxfDataDefinition,
        util::{
            logger,
            mxf_builder::{MinimalTrackFile, uid},
        },
    };
    use imf_validation_types::{sets::SetKind, ul::MxfUid};

    #[test]
    fn minimal_file_builds_a_graph() {
        logger();
        let file = MinimalTrackFile::default().build();
        let mut log = ErrorLog::new();
        let header = HeaderPartition::from_provider(
            &file.bytes,
            file.header_offset,
            file.header_length,
            &mut log,
        )
        .unwrap();

        assert!(log.is_empty(), "{log}");
        assert!(header.partition_pack().is_some());
        assert_eq!(header.material_packages().len(), 1);
        assert_eq!(header.source_packages().len(), 1);
        assert_eq!(header.essence_container_data().len(), 1);

        let fp = header.top_level_file_package().unwrap();
        let tracks = header.tracks(fp);
        assert_eq!(tracks.len(), 1);
        assert_eq!(header.track_data_kind(tracks[0]), MxfDataDefinition::Sound);

        let descriptor = header.top_level_descriptor().unwrap();
        assert_eq!(descriptor.kind, SetKind::WaveAudioEssenceDescriptor);
        assert_eq!(header.sub_descriptors(descriptor).len(), 1);
    }

    #[test]
    fn parsing_is_idempotent() {
        logger();
        let file = MinimalTrackFile::default().build();
        let range = &file.bytes[file.header_offset as usize
            ..(file.header_offset + file.header_length) as usize];

        let a = HeaderPartition::parse(range, file.header_offset, &mut ErrorLog::new()).unwrap();
        let b = HeaderPartition::parse(range, file.header_offset, &mut ErrorLog::new()).unwrap();
        assert_eq!(a, b);

        let uids_a: Vec<MxfUid> = a.sets().iter().map(|s| s.instance_uid).collect();
        let uids_b: Vec<MxfUid> = b.sets().iter().map(|s| s.instance_uid).collect();
        assert_eq!(uids_a, uids_b);
    }

    #[test]
    fn dangling_required_reference_is_fatal() {
        logger();
        let file = MinimalTrackFile {
            dangling_descriptor: true,
            ..Default::default()
        }
        .build();

        let mut log = ErrorLog::new();
        let err = HeaderPartition::from_provider(
            &file.bytes,
            file.header_offset,
            file.header_length,
            &mut log,
        )
        .unwrap_err();

        assert!(matches!(err, MxfError::UnresolvedReference { from: SetKind::SourcePackage, .. }));
        assert_eq!(log.errors_by_level(ErrorLevel::Fatal, None).len(), 1);
    }

    #[test]
    fn dangling_sub_descriptor_is_a_warning() {
        logger();
        let file = MinimalTrackFile {
            dangling_sub_descriptor: true,
            ..Default::default()
        }
        .build();

        let mut log = ErrorLog::new();
        let header = HeaderPartition::from_provider(
            &file.bytes,
            file.header_offset,
            file.header_length,
            &mut log,
        )
        .unwrap();

        assert!(!log.has_fatal_errors());
        assert_eq!(log.errors_by_level(ErrorLevel::Warning, None).len(), 1);
        let descriptor = header.top_level_descriptor().unwrap();
        assert_eq!(header.sub_descriptors(descriptor).len(), 1);
    }

    #[test]
    fn lookups_by_uid() {
        logger();
        let file = MinimalTrackFile::default().build();
        let header = HeaderPartition::from_provider(
            &file.bytes,
            file.header_offset,
            file.header_length,
            &mut ErrorLog::new(),
        )
        .unwrap();

        let preface = header.by_instance_uid(&uid(1)).unwrap();
        assert_eq!(preface.kind, SetKind::Preface);
        assert!(header.by_instance_uid(&uid(250)).is_none());
    }

    #[test]
    fn sets_need_a_primer() {
        logger();
        let file = MinimalTrackFile {
            omit_primer: true,
            ..Default::default()
        }
        .build();

        assert!(matches!(
            HeaderPartition::from_provider(
                &file.bytes,
                file.header_offset,
                file.header_length,
                &mut ErrorLog::new(),
            ),
            Err(MxfError::MissingPrimerPack)
        ));
    }
}

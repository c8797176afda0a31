//! Operational Pattern 1A checks (SMPTE ST 378).
//!
//! OP1A files hold one material package playing one file package from start
//! to end. These checks confirm a parsed header partition really has that
//! shape. Every check runs, and only then does the batch fail if any of them
//! logged a FATAL error.

use imf_validation_types::{labels, sets::SetKind, ul::MxfUid};

use crate::{
    error::ValidationFailure,
    error_log::{ErrorCode, ErrorLevel, ErrorLog},
    header::{
        HeaderPartition,
        objects::{MetadataSet, Package, TimelineTrack},
    },
    partition::PartitionPack,
};

/// Tracks may disagree on their duration by this many seconds.
pub const DURATION_TOLERANCE: f64 = 1.0;

/// A header partition that passed the OP1A checks.
#[derive(Clone, Copy, Debug)]
pub struct HeaderPartitionOp1a<'h> {
    header: &'h HeaderPartition,
    material_package: &'h Package,
    file_package_set: &'h MetadataSet,
    file_package: &'h Package,
    essence_track: &'h TimelineTrack,
}

impl<'h> HeaderPartitionOp1a<'h> {
    pub fn header(&self) -> &'h HeaderPartition {
        self.header
    }

    pub fn material_package(&self) -> &'h Package {
        self.material_package
    }

    /// The top-level file package.
    pub fn file_package(&self) -> &'h Package {
        self.file_package
    }

    pub fn file_package_set(&self) -> &'h MetadataSet {
        self.file_package_set
    }

    /// The file package's only essence track.
    pub fn essence_track(&self) -> &'h TimelineTrack {
        self.essence_track
    }

    /// The file package's essence descriptor.
    pub fn descriptor(&self) -> Option<&'h MetadataSet> {
        self.header.descriptor(self.file_package)
    }
}

fn fatal(log: &mut ErrorLog, description: String) {
    log.add_error(
        ErrorCode::ImfEssenceComponentError,
        ErrorLevel::Fatal,
        description,
    );
}

/// Checks a header partition against OP1A.
///
/// Every problem is written to `log`. If any of them are FATAL, the returned
/// failure carries the whole ledger.
pub fn check_operational_pattern1a_compliance<'h>(
    header: &'h HeaderPartition,
    log: &mut ErrorLog,
) -> Result<HeaderPartitionOp1a<'h>, ValidationFailure> {
    let batch_start = log.len();

    // operational pattern
    match header.preface() {
        Some(preface) => {
            if !preface
                .operational_pattern
                .equals_with_mask(&labels::OP1A, labels::OP1A_MASK)
            {
                fatal(
                    log,
                    format!(
                        "Preface operational pattern `{}` isn't OP1A.",
                        preface.operational_pattern
                    ),
                );
            }
        }
        None => fatal(log, "The header partition has no Preface.".into()),
    }

    // exactly one of each top-level set
    let content_storages = header.sets_of(SetKind::ContentStorage).count();
    if content_storages != 1 {
        fatal(
            log,
            format!("Expected exactly one ContentStorage set, but found `{content_storages}`."),
        );
    }

    let ecds = header.essence_container_data();
    if ecds.len() != 1 {
        fatal(
            log,
            format!(
                "Expected exactly one EssenceContainerData set, but found `{}`.",
                ecds.len()
            ),
        );
    }

    let material_packages = header.material_packages();
    if material_packages.len() != 1 {
        fatal(
            log,
            format!(
                "Expected exactly one Material Package, but found `{}`.",
                material_packages.len()
            ),
        );
    }

    let file_package_set = header.top_level_file_package_set();
    let file_package = file_package_set.and_then(MetadataSet::as_package);
    if file_package.is_none() {
        fatal(
            log,
            "No source package matches the EssenceContainerData's linked package UID.".into(),
        );
    }

    let essence_tracks: Vec<&TimelineTrack> = file_package
        .map(|fp| {
            header
                .tracks(fp)
                .into_iter()
                .filter(|t| header.track_data_kind(t).is_essence())
                .collect()
        })
        .unwrap_or_default();
    if file_package.is_some() && essence_tracks.len() != 1 {
        fatal(
            log,
            format!(
                "The top-level file package has `{}` essence tracks, but OP1A allows exactly one.",
                essence_tracks.len()
            ),
        );
    }

    // material package source clips
    let mut referenced_package: Option<MxfUid> = None;
    for mp in &material_packages {
        for track in header.tracks(mp) {
            let Some(sequence) = header.sequence(track) else {
                continue;
            };
            if !sequence.data_kind().is_essence() {
                continue;
            }

            let clips = header.source_clips(sequence);
            if clips.len() != 1 || sequence.structural_components.len() != 1 {
                fatal(
                    log,
                    format!(
                        "Material Package track `{}` has `{}` structural components, but OP1A needs exactly one SourceClip.",
                        track.track_id,
                        sequence.structural_components.len()
                    ),
                );
            }

            for clip in clips {
                match referenced_package {
                    None => referenced_package = Some(clip.source_package_id),
                    Some(uid) if uid != clip.source_package_id => fatal(
                        log,
                        format!(
                            "Material Package SourceClips reference different packages: `{uid}` and `{}`.",
                            clip.source_package_id
                        ),
                    ),
                    Some(_) => (),
                }
            }
        }
    }

    if let Some(uid) = referenced_package {
        let in_content_storage = header.content_storage().is_some_and(|cs| {
            cs.packages
                .iter()
                .filter_map(|r| header.get(r))
                .filter(|s| s.kind == SetKind::SourcePackage)
                .filter_map(MetadataSet::as_package)
                .any(|p| p.package_uid == uid)
        });
        if !in_content_storage {
            fatal(
                log,
                format!("SourceClips reference package `{uid}`, which ContentStorage doesn't list."),
            );
        }

        if let Some(ecd) = ecds.first() {
            if ecd.linked_package_uid != uid {
                fatal(
                    log,
                    format!(
                        "SourceClips reference package `{uid}`, but EssenceContainerData links to `{}`.",
                        ecd.linked_package_uid
                    ),
                );
            }
        }
    }

    // track durations
    let all_tracks = material_packages
        .iter()
        .copied()
        .chain(file_package)
        .flat_map(|p| header.tracks(p));
    check_track_durations(header, all_tracks, log);

    ValidationFailure::check_batch(log, batch_start)?;

    // every arm here was checked above, so a miss would be a logic error
    match (
        material_packages.first(),
        file_package_set,
        file_package,
        essence_tracks.first(),
    ) {
        (Some(mp), Some(fps), Some(fp), Some(track)) => Ok(HeaderPartitionOp1a {
            header,
            material_package: mp,
            file_package_set: fps,
            file_package: fp,
            essence_track: track,
        }),
        _ => {
            log.add_error(
                ErrorCode::InternalError,
                ErrorLevel::Fatal,
                "OP1A checks passed without a material package, file package, and essence track.",
            );
            Err(ValidationFailure::new(log.clone()))
        }
    }
}

/// Every track's duration, in seconds, must agree with the first track that
/// has a usable edit rate, even when that track is empty.
fn check_track_durations<'h>(
    header: &'h HeaderPartition,
    tracks: impl Iterator<Item = &'h TimelineTrack>,
    log: &mut ErrorLog,
) {
    let mut reference: Option<f64> = None;

    for track in tracks {
        let Some(duration) = header.sequence(track).and_then(|s| s.duration) else {
            log.add_error(
                ErrorCode::ImfEssenceComponentError,
                ErrorLevel::Warning,
                format!("Track `{}` has no sequence duration.", track.track_id),
            );
            continue;
        };

        let rate = track.edit_rate;
        if rate.numerator == 0 || rate.denominator == 0 {
            fatal(
                log,
                format!("Track `{}` has an invalid edit rate `{rate}`.", track.track_id),
            );
            continue;
        }

        let seconds = duration as f64 * rate.denominator as f64 / rate.numerator as f64;
        let Some(reference) = reference else {
            reference = Some(seconds);
            continue;
        };
        if (reference - seconds).abs() > DURATION_TOLERANCE {
            fatal(
                log,
                format!(
                    "Track `{}` lasts `{seconds:.3}` seconds, but other tracks last `{reference:.3}` seconds.",
                    track.track_id
                ),
            );
        }
    }
}

/// Every partition pack must declare OP1A.
pub fn check_partition_packs_op1a(
    packs: &[PartitionPack],
    log: &mut ErrorLog,
) -> Result<(), ValidationFailure> {
    let batch_start = log.len();

    for pack in packs {
        if !pack
            .operational_pattern
            .equals_with_mask(&labels::OP1A, labels::OP1A_MASK)
        {
            fatal(
                log,
                format!(
                    "Partition pack at offset `{}` has operational pattern `{}`, which isn't OP1A.",
                    pack.byte_offset, pack.operational_pattern
                ),
            );
        }
    }

    ValidationFailure::check_batch(log, batch_start)
}

#[cfg(test)]
mod tests {
    use super::{check_operational_pattern1a_compliance, check_partition_packs_op1a};
    use crate::{
        error_log::{ErrorCode, ErrorLevel, ErrorLog},
        header::HeaderPartition,
        partition::locate_partitions,
        util::{logger, mxf_builder::MinimalTrackFile},
    };
    use imf_validation_types::{primitives::Rational, sets::SetKind, ul::Ul};

    fn header_of(file: &MinimalTrackFile) -> HeaderPartition {
        let built = file.build();
        HeaderPartition::from_provider(
            &built.bytes,
            built.header_offset,
            built.header_length,
            &mut ErrorLog::new(),
        )
        .unwrap()
    }

    #[test]
    fn minimal_file_passes() {
        logger();
        let header = header_of(&MinimalTrackFile::default());
        let mut log = ErrorLog::new();

        let op1a = check_operational_pattern1a_compliance(&header, &mut log).unwrap();
        assert!(!log.has_fatal_errors(), "{log}");
        assert_eq!(op1a.header().material_packages().len(), 1);
        assert_eq!(
            op1a.descriptor().map(|d| d.kind),
            Some(SetKind::WaveAudioEssenceDescriptor)
        );
    }

    #[test]
    fn durations_within_a_second_pass() {
        logger();
        // 48 frames at 24 fps and 50 frames at 25 fps are both 2 seconds;
        // 49 at 25 fps is 1.96 seconds
        let header = header_of(&MinimalTrackFile {
            material_edit_rate: Rational::new(24, 1),
            material_duration: 48,
            file_edit_rate: Rational::new(25, 1),
            file_duration: 49,
            ..Default::default()
        });

        let mut log = ErrorLog::new();
        assert!(check_operational_pattern1a_compliance(&header, &mut log).is_ok());
        assert!(!log.has_fatal_errors());
    }

    #[test]
    fn durations_over_a_second_apart_fail() {
        logger();
        // 2 seconds against 4 seconds
        let header = header_of(&MinimalTrackFile {
            material_edit_rate: Rational::new(24, 1),
            material_duration: 48,
            file_edit_rate: Rational::new(25, 1),
            file_duration: 100,
            ..Default::default()
        });

        let mut log = ErrorLog::new();
        let failure = check_operational_pattern1a_compliance(&header, &mut log).unwrap_err();

        let fatal = failure.log().errors_by_level(ErrorLevel::Fatal, None);
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].code(), ErrorCode::ImfEssenceComponentError);
    }

    #[test]
    fn empty_track_is_compared_too() {
        logger();
        let fatal_count = |material_duration: i64, file_duration: i64| {
            let header = header_of(&MinimalTrackFile {
                material_duration,
                file_duration,
                ..Default::default()
            });
            let mut log = ErrorLog::new();
            _ = check_operational_pattern1a_compliance(&header, &mut log);
            log.errors_by_level(ErrorLevel::Fatal, None).len()
        };

        // 0 seconds against 2 seconds, whichever track comes first
        assert_eq!(fatal_count(0, 48), 1);
        assert_eq!(fatal_count(48, 0), 1);
        assert_eq!(fatal_count(0, 0), 0);
    }

    #[test]
    fn zero_denominator_edit_rate_fails() {
        logger();
        let header = header_of(&MinimalTrackFile {
            material_edit_rate: Rational::new(24, 0),
            ..Default::default()
        });

        let mut log = ErrorLog::new();
        let failure = check_operational_pattern1a_compliance(&header, &mut log).unwrap_err();
        let fatal = failure.log().errors_by_level(ErrorLevel::Fatal, None);
        assert_eq!(fatal.len(), 1, "{log}");
        assert!(fatal[0].description().contains("invalid edit rate"));
    }

    #[test]
    fn every_check_runs_before_failing() {
        logger();
        let header = header_of(&MinimalTrackFile {
            operational_pattern: Ul::from_u128(0x060e2b34_04010101_0d010201_02010000),
            file_duration: 1000,
            ..Default::default()
        });

        let mut log = ErrorLog::new();
        let failure = check_operational_pattern1a_compliance(&header, &mut log).unwrap_err();
        assert_eq!(failure.log().errors_by_level(ErrorLevel::Fatal, None).len(), 2);
        assert_eq!(failure.log(), &log);
    }

    #[test]
    fn clip_referencing_another_package_fails() {
        logger();
        let header = header_of(&MinimalTrackFile {
            clip_references_other_package: true,
            ..Default::default()
        });

        let mut log = ErrorLog::new();
        assert!(check_operational_pattern1a_compliance(&header, &mut log).is_err());
        assert!(log.has_fatal_errors());
    }

    #[test]
    fn partition_pack_patterns() {
        logger();
        let built = MinimalTrackFile::default().build();
        let layout = locate_partitions(&built.bytes).unwrap();

        let mut log = ErrorLog::new();
        assert!(check_partition_packs_op1a(&layout.partitions, &mut log).is_ok());

        let mut packs = layout.partitions.clone();
        packs[1].operational_pattern = Ul::from_u128(0x060e2b34_04010101_0d010201_01020100);
        let failure = check_partition_packs_op1a(&packs, &mut log).unwrap_err();
        assert_eq!(failure.log().errors_by_level(ErrorLevel::Fatal, None).len(), 1);
    }
}

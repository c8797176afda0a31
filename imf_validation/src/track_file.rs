//! Checks a whole track file, from its random index pack to its essence
//! partitions.

use crate::{
    error::{MxfError, ValidationFailure},
    error_log::{ErrorLevel, ErrorLog},
    header::{HeaderPartition, objects::MxfDataDefinition},
    imf_constraints::{
        check_imf_compliance, check_imf_essence_partitions, check_partition_packs_imf_compliance,
    },
    op1a::{check_operational_pattern1a_compliance, check_partition_packs_op1a},
    partition::{PartitionLayout, locate_partitions},
    provider::ResourceByteRangeProvider,
};

/// Why a track file couldn't be validated.
#[derive(Clone, Debug)]
pub enum TrackFileError {
    /// The bytes couldn't be read as MXF. Nothing past the failure was
    /// checked.
    Corrupt(MxfError),

    /// The file parsed, but broke at least one FATAL constraint.
    NonCompliant(ValidationFailure),
}

impl core::fmt::Display for TrackFileError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TrackFileError::Corrupt(e) => write!(f, "The track file is corrupt. err: {e}"),
            TrackFileError::NonCompliant(e) => {
                write!(f, "The track file isn't IMF compliant. err: {e}")
            }
        }
    }
}

impl core::error::Error for TrackFileError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TrackFileError::Corrupt(e) => Some(e),
            TrackFileError::NonCompliant(e) => Some(e),
        }
    }
}

impl From<MxfError> for TrackFileError {
    fn from(value: MxfError) -> Self {
        TrackFileError::Corrupt(value)
    }
}

impl From<ValidationFailure> for TrackFileError {
    fn from(value: ValidationFailure) -> Self {
        TrackFileError::NonCompliant(value)
    }
}

/// A track file that passed every core check.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedTrackFile {
    pub layout: PartitionLayout,
    pub header: HeaderPartition,
    pub essence_kind: MxfDataDefinition,
}

/// Validates one track file against OP1A and the IMF core constraints.
///
/// Every check that can run does, so `log` ends up with every problem the
/// file has. Only then does this fail with the first FATAL batch.
pub fn validate_track_file(
    provider: &(impl ResourceByteRangeProvider + ?Sized),
    log: &mut ErrorLog,
) -> Result<ValidatedTrackFile, TrackFileError> {
    let batch_start = log.len();

    let layout = locate_partitions(provider)?;
    let (start, length) = layout.header_partition_extent().ok_or_else(|| {
        log::error!("The first partition starts after the random index pack.");
        MxfError::RandomIndexPack("partition offsets run past the random index pack")
    })?;
    let header = HeaderPartition::from_provider(provider, start, length, log)?;
    log::debug!(
        "Checking track file with `{}` partitions and `{}` header sets.",
        layout.partitions.len(),
        header.sets().len()
    );

    // each failure's entries are already in `log`
    _ = check_partition_packs_op1a(&layout.partitions, log);
    _ = check_partition_packs_imf_compliance(&layout.partitions, log);

    let mut essence_kind = MxfDataDefinition::Other;
    if let Ok(op1a) = check_operational_pattern1a_compliance(&header, log) {
        if let Ok(imf) = check_imf_compliance(op1a, log) {
            essence_kind = imf.essence_kind();
            _ = check_imf_essence_partitions(&imf, &layout.partitions, log);
        }
    }

    if let Err(failure) = ValidationFailure::check_batch(log, batch_start) {
        log::warn!(
            "Track file failed with `{}` FATAL errors.",
            failure.log().errors_by_level(ErrorLevel::Fatal, None).len()
        );
        return Err(failure.into());
    }

    Ok(ValidatedTrackFile {
        layout,
        header,
        essence_kind,
    })
}

#[cfg(test)]
mod tests {
    use super::{TrackFileError, validate_track_file};
    use crate::{
        error::MxfError,
        error_log::{ErrorLevel, ErrorLog},
        header::objects::MxfDataDefinition,
        util::{
            logger,
            mxf_builder::{Essence, MinimalTrackFile, PictureSpec},
        },
    };

    #[test]
    fn minimal_file_is_valid() {
        logger();
        let built = MinimalTrackFile::default().build();
        let mut log = ErrorLog::new();

        let validated = validate_track_file(&built.bytes, &mut log).unwrap();
        assert!(log.is_empty(), "{log}");
        assert_eq!(validated.essence_kind, MxfDataDefinition::Sound);
        assert_eq!(validated.layout.partitions.len(), 3);
        assert_eq!(validated.header.material_packages().len(), 1);
    }

    #[test]
    fn picture_file_is_valid() {
        logger();
        let built = MinimalTrackFile {
            essence: Essence::Picture(PictureSpec::default()),
            extra_body_partitions: 3,
            ..Default::default()
        }
        .build();
        let mut log = ErrorLog::new();

        // frame-wrapped pictures may use many partitions
        let validated = validate_track_file(&built.bytes, &mut log).unwrap();
        assert_eq!(validated.essence_kind, MxfDataDefinition::Picture);
        assert_eq!(validated.layout.essence_partitions().len(), 4);
    }

    #[test]
    fn header_and_partition_problems_are_both_reported() {
        logger();
        let built = MinimalTrackFile {
            quantization_bits: 16,
            essence_in_header: true,
            ..Default::default()
        }
        .build();
        let mut log = ErrorLog::new();

        let Err(TrackFileError::NonCompliant(failure)) = validate_track_file(&built.bytes, &mut log)
        else {
            panic!("expected a compliance failure");
        };
        let fatal = failure.log().errors_by_level(ErrorLevel::Fatal, None);
        assert_eq!(fatal.len(), 2, "{log}");
        assert!(fatal.iter().any(|e| e.description().contains("offset `0`")));
        assert!(fatal.iter().any(|e| e.description().contains("quantization bits")));
        assert_eq!(failure.log(), &log);
    }

    #[test]
    fn corrupt_header_is_not_a_compliance_failure() {
        logger();
        let built = MinimalTrackFile {
            dangling_descriptor: true,
            ..Default::default()
        }
        .build();
        let mut log = ErrorLog::new();

        assert!(matches!(
            validate_track_file(&built.bytes, &mut log),
            Err(TrackFileError::Corrupt(MxfError::UnresolvedReference { .. }))
        ));
        assert!(log.has_fatal_errors());
    }

    #[test]
    fn missing_rip_is_corrupt() {
        logger();
        let mut built = MinimalTrackFile::default().build();
        let len = built.bytes.len();
        built.bytes.truncate(len - 10);

        let err = validate_track_file(&built.bytes, &mut ErrorLog::new()).unwrap_err();
        assert!(matches!(err, TrackFileError::Corrupt(_)));
        assert!(err.to_string().starts_with("The track file is corrupt."));
    }
}

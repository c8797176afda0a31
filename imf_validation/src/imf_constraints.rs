//! IMF core constraints (SMPTE ST 2067-5 and ST 2067-2).
//!
//! These build on [`crate::op1a`]. A header partition is only checked here
//! once it's known to be OP1A.

use imf_validation_types::{labels, primitives::Rational, sets::SetKind};

use crate::{
    error::ValidationFailure,
    error_log::{ErrorCode, ErrorLevel, ErrorLog},
    header::objects::{MetadataSet, MxfDataDefinition, WaveAudioDescriptor},
    op1a::HeaderPartitionOp1a,
    partition::PartitionPack,
};

/// `SinglePackage`, in the low nibble of the operational pattern's byte 13.
const SINGLE_PACKAGE: u8 = 0x01;

/// Wave audio in IMF is always 24-bit.
pub const IMF_AUDIO_QUANTIZATION_BITS: u32 = 24;

/// The sample rates IMF allows for wave audio.
pub const IMF_AUDIO_SAMPLE_RATES: [Rational; 2] = [Rational::new(48_000, 1), Rational::new(96_000, 1)];

/// A header partition that passed both the OP1A and IMF core checks.
#[derive(Clone, Copy, Debug)]
pub struct HeaderPartitionImf<'h> {
    op1a: HeaderPartitionOp1a<'h>,
    essence_kind: MxfDataDefinition,
}

impl<'h> HeaderPartitionImf<'h> {
    pub fn op1a(&self) -> &HeaderPartitionOp1a<'h> {
        &self.op1a
    }

    /// What kind of essence the file carries.
    pub fn essence_kind(&self) -> MxfDataDefinition {
        self.essence_kind
    }

    pub fn descriptor(&self) -> Option<&'h MetadataSet> {
        self.op1a.descriptor()
    }
}

fn fatal(log: &mut ErrorLog, description: String) {
    log.add_error(
        ErrorCode::ImfCoreConstraintsError,
        ErrorLevel::Fatal,
        description,
    );
}

/// Checks an OP1A header partition against the IMF core constraints.
pub fn check_imf_compliance<'h>(
    op1a: HeaderPartitionOp1a<'h>,
    log: &mut ErrorLog,
) -> Result<HeaderPartitionImf<'h>, ValidationFailure> {
    let batch_start = log.len();
    let header = op1a.header();

    // package complexity
    if let Some(preface) = header.preface() {
        let complexity = preface.operational_pattern.0[13] & 0x0f;
        if complexity != SINGLE_PACKAGE {
            fatal(
                log,
                format!(
                    "Operational pattern `{}` has package complexity `{complexity}`, but IMF needs SinglePackage.",
                    preface.operational_pattern
                ),
            );
        }

        // the primary package must be the top-level file package
        let file_package_uid = op1a.file_package_set().instance_uid;
        match preface.primary_package {
            Some(uid) if uid == file_package_uid => (),
            Some(uid) => fatal(
                log,
                format!(
                    "Preface's primary package `{uid}` isn't the top-level file package `{file_package_uid}`."
                ),
            ),
            None => fatal(log, "Preface has no primary package.".into()),
        }
    }

    // essence descriptor kind
    let essence_kind = header.track_data_kind(op1a.essence_track());
    let descriptor = op1a.descriptor();
    match (essence_kind, descriptor) {
        (_, None) => fatal(log, "The top-level file package has no essence descriptor.".into()),

        (MxfDataDefinition::Sound, Some(d)) => match d.kind {
            SetKind::WaveAudioEssenceDescriptor => {
                if let Some(wave) = d.as_wave_audio_descriptor() {
                    check_wave_audio(op1a, d, wave, log);
                }
            }
            // these have their own plugin profiles
            SetKind::IabEssenceDescriptor | SetKind::MgaSoundEssenceDescriptor => (),
            other => fatal(
                log,
                format!(
                    "Audio essence is described by `{}`, but IMF needs a WaveAudioEssenceDescriptor.",
                    other.name()
                ),
            ),
        },

        (MxfDataDefinition::Picture, Some(d)) => {
            if d.as_picture_descriptor().is_none() {
                fatal(
                    log,
                    format!(
                        "Picture essence is described by `{}`, but IMF needs a CDCI or RGBA descriptor.",
                        d.kind.name()
                    ),
                );
            }
        }

        (_, Some(_)) => (),
    }

    ValidationFailure::check_batch(log, batch_start)?;
    Ok(HeaderPartitionImf { op1a, essence_kind })
}

/// Wave audio rules from ST 2067-2.
fn check_wave_audio(
    op1a: HeaderPartitionOp1a<'_>,
    set: &MetadataSet,
    wave: &WaveAudioDescriptor,
    log: &mut ErrorLog,
) {
    let sound = &wave.sound;

    match wave.channel_assignment {
        Some(ul) if ul.equals_ignoring_version(&labels::IMF_AUDIO_CHANNEL_ASSIGNMENT) => (),
        Some(ul) => fatal(
            log,
            format!("WaveAudioEssenceDescriptor's channel assignment `{ul}` isn't the IMF MCA label."),
        ),
        None => fatal(
            log,
            "WaveAudioEssenceDescriptor has no channel assignment.".into(),
        ),
    }

    if !IMF_AUDIO_SAMPLE_RATES
        .iter()
        .any(|r| r.same_value(&sound.audio_sampling_rate))
    {
        fatal(
            log,
            format!(
                "Audio sampling rate `{}` isn't 48 kHz or 96 kHz.",
                sound.audio_sampling_rate
            ),
        );
    }

    if sound.quantization_bits != IMF_AUDIO_QUANTIZATION_BITS {
        fatal(
            log,
            format!(
                "Audio has `{}` quantization bits, but IMF needs `{IMF_AUDIO_QUANTIZATION_BITS}`.",
                sound.quantization_bits
            ),
        );
    }

    let expected_align = sound.channel_count as u64 * 3;
    if wave.block_align as u64 != expected_align {
        fatal(
            log,
            format!(
                "Block align is `{}`, but `{}` channels of 24-bit audio need `{expected_align}`.",
                wave.block_align, sound.channel_count
            ),
        );
    }

    let has_soundfield_group = op1a
        .header()
        .sub_descriptors(set)
        .iter()
        .any(|s| s.kind == SetKind::SoundfieldGroupLabelSubDescriptor);
    if !has_soundfield_group {
        fatal(
            log,
            "WaveAudioEssenceDescriptor has no SoundfieldGroupLabelSubDescriptor.".into(),
        );
    }
}

/// No partition may mix header metadata, index table segments, and essence.
///
/// Each offending partition gets exactly one FATAL entry.
pub fn check_partition_packs_imf_compliance(
    packs: &[PartitionPack],
    log: &mut ErrorLog,
) -> Result<(), ValidationFailure> {
    let batch_start = log.len();

    for pack in packs {
        if pack.content_kinds() > 1 {
            fatal(
                log,
                format!(
                    "Partition at offset `{}` has more than one of header metadata `{}`, index table segments `{}`, and essence `{}`.",
                    pack.byte_offset,
                    pack.has_header_metadata(),
                    pack.has_index_table_segments(),
                    pack.has_essence_container()
                ),
            );
        }
    }

    ValidationFailure::check_batch(log, batch_start)
}

/// Audio track files must be clip-wrapped: exactly one partition carries
/// essence.
pub fn check_imf_essence_partitions(
    imf: &HeaderPartitionImf<'_>,
    packs: &[PartitionPack],
    log: &mut ErrorLog,
) -> Result<(), ValidationFailure> {
    let batch_start = log.len();

    if imf.essence_kind() == MxfDataDefinition::Sound {
        let essence_partitions = packs.iter().filter(|p| p.has_essence_container()).count();
        if essence_partitions != 1 {
            fatal(
                log,
                format!(
                    "Audio essence is spread over `{essence_partitions}` partitions, but must be clip-wrapped in one."
                ),
            );
        }
    }

    ValidationFailure::check_batch(log, batch_start)
}

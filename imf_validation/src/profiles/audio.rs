//! A sound track file's essence characteristics.

use imf_validation_types::{primitives::Rational, sets::SetKind, ul::Ul};

use crate::{
    error_log::{ErrorCode, ErrorLevel, ErrorLog},
    header::{
        HeaderPartition,
        objects::{McaLabel, MetadataSet},
    },
    imf_constraints::{IMF_AUDIO_QUANTIZATION_BITS, IMF_AUDIO_SAMPLE_RATES},
};

/// An MCA label sub-descriptor, as the audio profiles see it.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioLabel {
    pub kind: SetKind,
    pub label: McaLabel,
}

/// Everything the audio profiles need to know about a sound descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioEssenceDescriptorModel {
    pub descriptor_kind: SetKind,

    /// The descriptor's sample rate, which is also the track's edit rate.
    pub sample_rate: Rational,
    pub audio_sampling_rate: Rational,
    pub channel_count: u32,
    pub quantization_bits: u32,
    pub sound_compression: Option<Ul>,
    pub essence_container: Ul,
    pub labels: Vec<AudioLabel>,
}

impl AudioEssenceDescriptorModel {
    /// Builds the model from the top-level file package's descriptor.
    pub fn from_header(header: &HeaderPartition, log: &mut ErrorLog) -> Option<Self> {
        let Some(descriptor) = header.top_level_descriptor() else {
            log.add_error(
                ErrorCode::ImfEssenceMetadataError,
                ErrorLevel::Fatal,
                "The top-level file package has no essence descriptor.",
            );
            return None;
        };
        Self::from_descriptor(header, descriptor, log)
    }

    pub fn from_descriptor(
        header: &HeaderPartition,
        descriptor: &MetadataSet,
        log: &mut ErrorLog,
    ) -> Option<Self> {
        let Some(sound) = descriptor.as_sound_descriptor() else {
            log.add_error(
                ErrorCode::ImfEssenceMetadataError,
                ErrorLevel::Fatal,
                format!("`{}` isn't a sound descriptor.", descriptor.kind.name()),
            );
            return None;
        };

        let labels = header
            .sub_descriptors(descriptor)
            .into_iter()
            .filter_map(|s| {
                s.as_mca_label().map(|label| AudioLabel {
                    kind: s.kind,
                    label: label.clone(),
                })
            })
            .collect();

        Some(AudioEssenceDescriptorModel {
            descriptor_kind: descriptor.kind,
            sample_rate: sound.file.sample_rate,
            audio_sampling_rate: sound.audio_sampling_rate,
            channel_count: sound.channel_count,
            quantization_bits: sound.quantization_bits,
            sound_compression: sound.sound_compression,
            essence_container: sound.file.essence_container,
            labels,
        })
    }

    /// Labels of one kind.
    pub fn labels_of(&self, kind: SetKind) -> impl Iterator<Item = &McaLabel> {
        self.labels
            .iter()
            .filter(move |l| l.kind == kind)
            .map(|l| &l.label)
    }
}

/// Checks shared by the immersive audio profiles: container, compression,
/// 24-bit samples and a 48 kHz or 96 kHz sampling rate.
pub(crate) fn check_immersive_audio(
    specification: &str,
    audio: &AudioEssenceDescriptorModel,
    container: &Ul,
    compression: &Ul,
    log: &mut ErrorLog,
) {
    let mut fail = |description: String| {
        log.add_error(
            ErrorCode::ImfEssenceComponentError,
            ErrorLevel::Fatal,
            format!("{specification}: {description}"),
        )
    };

    if !audio.essence_container.equals_ignoring_version(container) {
        fail(format!(
            "essence container `{}` should be `{container}`.",
            audio.essence_container
        ));
    }

    match audio.sound_compression {
        Some(ul) if ul.equals_ignoring_version(compression) => (),
        Some(ul) => fail(format!("sound compression `{ul}` should be `{compression}`.")),
        None => fail("sound compression is missing.".into()),
    }

    if audio.quantization_bits != IMF_AUDIO_QUANTIZATION_BITS {
        fail(format!(
            "`{}` quantization bits, but `{IMF_AUDIO_QUANTIZATION_BITS}` are needed.",
            audio.quantization_bits
        ));
    }

    if !IMF_AUDIO_SAMPLE_RATES
        .iter()
        .any(|r| r.same_value(&audio.audio_sampling_rate))
    {
        fail(format!(
            "audio sampling rate `{}` isn't 48 kHz or 96 kHz.",
            audio.audio_sampling_rate
        ));
    }
}

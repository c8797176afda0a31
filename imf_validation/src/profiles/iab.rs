//! Immersive audio bitstream plug-in (SMPTE ST 2067-201).

use imf_validation_types::{labels, sets::SetKind};

use crate::{
    error_log::{ErrorCode, ErrorLevel, ErrorLog, ErrorObject},
    header::HeaderPartition,
    profiles::{
        ApplicationProfileValidator, CompositionSummary, VirtualTrackKind, check_track_edit_rate,
        audio::{AudioEssenceDescriptorModel, check_immersive_audio},
    },
};

const SPECIFICATION: &str = "SMPTE ST 2067-201:2019";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IabValidator;

impl IabValidator {
    /// Checks one IAB track file's model.
    pub fn validate_audio(&self, audio: &AudioEssenceDescriptorModel, log: &mut ErrorLog) {
        if audio.descriptor_kind != SetKind::IabEssenceDescriptor {
            log.add_error(
                ErrorCode::ImfEssenceComponentError,
                ErrorLevel::Fatal,
                format!(
                    "{SPECIFICATION}: essence is described by `{}`, not an IABEssenceDescriptor.",
                    audio.descriptor_kind.name()
                ),
            );
            return;
        }

        check_immersive_audio(
            SPECIFICATION,
            audio,
            &labels::IAB_CLIP_WRAPPED_CONTAINER,
            &labels::IAB_SOUND_COMPRESSION,
            log,
        );

        // IAB carries its channels in the bitstream
        if audio.channel_count != 0 {
            log.add_error(
                ErrorCode::ImfEssenceComponentError,
                ErrorLevel::Fatal,
                format!(
                    "{SPECIFICATION}: channel count is `{}`, but must be 0.",
                    audio.channel_count
                ),
            );
        }

        if audio
            .labels_of(SetKind::IabSoundfieldLabelSubDescriptor)
            .next()
            .is_none()
        {
            log.add_error(
                ErrorCode::ImfEssenceComponentError,
                ErrorLevel::Fatal,
                format!("{SPECIFICATION}: there's no IABSoundfieldLabelSubDescriptor."),
            );
        }
    }
}

impl ApplicationProfileValidator for IabValidator {
    fn constraints_specification(&self) -> &'static str {
        SPECIFICATION
    }

    fn validate_composition_constraints(
        &self,
        composition: &CompositionSummary,
    ) -> Vec<ErrorObject> {
        let mut log = ErrorLog::new();
        for track in composition.tracks_of(VirtualTrackKind::Iab) {
            check_track_edit_rate(SPECIFICATION, composition, track, &mut log);
            for audio in track.resources.iter().filter_map(|r| r.as_audio()) {
                self.validate_audio(audio, &mut log);
            }
        }
        log.into_errors()
    }

    fn validate_track_file_constraints(&self, header: &HeaderPartition) -> Vec<ErrorObject> {
        let mut log = ErrorLog::new();
        let Some(descriptor) = header.top_level_descriptor() else {
            return log.into_errors();
        };
        if descriptor.kind != SetKind::IabEssenceDescriptor {
            return log.into_errors();
        }

        if let Some(audio) = AudioEssenceDescriptorModel::from_descriptor(header, descriptor, &mut log) {
            self.validate_audio(&audio, &mut log);
        }
        log.into_errors()
    }
}

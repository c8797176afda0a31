//! MGA S-ADM audio plug-in (SMPTE ST 2067-203).

use imf_validation_types::{labels, sets::SetKind};

use crate::{
    error_log::{ErrorCode, ErrorLevel, ErrorLog, ErrorObject},
    header::HeaderPartition,
    profiles::{
        ApplicationProfileValidator, CompositionSummary, VirtualTrackKind, check_track_edit_rate,
        audio::{AudioEssenceDescriptorModel, check_immersive_audio},
    },
};

const SPECIFICATION: &str = "SMPTE ST 2067-203:2022";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MgaValidator;

fn fatal(log: &mut ErrorLog, description: String) {
    log.add_error(
        ErrorCode::ImfEssenceComponentError,
        ErrorLevel::Fatal,
        format!("{SPECIFICATION}: {description}"),
    );
}

impl MgaValidator {
    /// Checks one MGA track file's model.
    pub fn validate_audio(&self, audio: &AudioEssenceDescriptorModel, log: &mut ErrorLog) {
        if audio.descriptor_kind != SetKind::MgaSoundEssenceDescriptor {
            fatal(
                log,
                format!(
                    "essence is described by `{}`, not an MGASoundEssenceDescriptor.",
                    audio.descriptor_kind.name()
                ),
            );
            return;
        }

        check_immersive_audio(
            SPECIFICATION,
            audio,
            &labels::MGA_CLIP_WRAPPED_CONTAINER,
            &labels::MGA_SOUND_COMPRESSION,
            log,
        );

        let groups = audio
            .labels_of(SetKind::MgaSoundfieldGroupLabelSubDescriptor)
            .collect::<Vec<_>>();
        if groups.is_empty() {
            fatal(log, "there's no MGASoundfieldGroupLabelSubDescriptor.".into());
        }

        for group in groups {
            if group.mga_metadata_section_link_id.is_none() {
                fatal(
                    log,
                    format!(
                        "soundfield group `{}` has no MGA metadata section link ID.",
                        group.tag_symbol
                    ),
                );
            }
            if group.adm_audio_programme_id.is_none() {
                fatal(
                    log,
                    format!(
                        "soundfield group `{}` has no ADM audio programme ID.",
                        group.tag_symbol
                    ),
                );
            }
        }
    }
}

impl ApplicationProfileValidator for MgaValidator {
    fn constraints_specification(&self) -> &'static str {
        SPECIFICATION
    }

    fn validate_composition_constraints(
        &self,
        composition: &CompositionSummary,
    ) -> Vec<ErrorObject> {
        let mut log = ErrorLog::new();
        for track in composition.tracks_of(VirtualTrackKind::Mga) {
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
        if descriptor.kind != SetKind::MgaSoundEssenceDescriptor {
            return log.into_errors();
        }

        if let Some(audio) = AudioEssenceDescriptorModel::from_descriptor(header, descriptor, &mut log) {
            self.validate_audio(&audio, &mut log);
        }
        log.into_errors()
    }
}

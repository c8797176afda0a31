//! App #5 (SMPTE ST 2067-50): ACES picture.

use imf_validation_types::{
    colorimetry::{ColorModel, ColorPrimaries, FrameLayout, Sampling, TransferCharacteristic},
    labels,
};

use crate::{
    error_log::{ErrorCode, ErrorLevel, ErrorLog, ErrorObject},
    header::HeaderPartition,
    profiles::{
        ApplicationProfileValidator, CompositionSummary, VirtualTrackKind, check_track_edit_rate,
        image::ImageEssenceDescriptorModel,
    },
};

const SPECIFICATION: &str = "SMPTE ST 2067-50:2017";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct App5Validator;

fn error(log: &mut ErrorLog, description: String) {
    log.add_error(
        ErrorCode::ApplicationCompositionError,
        ErrorLevel::NonFatal,
        format!("{SPECIFICATION}: {description}"),
    );
}

impl App5Validator {
    /// Checks one ACES picture's model.
    pub fn validate_image(&self, image: &ImageEssenceDescriptorModel, log: &mut ErrorLog) {
        if !image
            .essence_container
            .equals_ignoring_version(&labels::ACES_FRAME_WRAPPED_CONTAINER)
        {
            error(
                log,
                format!(
                    "essence container `{}` isn't frame-wrapped ACES.",
                    image.essence_container
                ),
            );
        }
        if image.color_model != ColorModel::Rgba {
            error(log, format!("color model is `{:?}`, not RGBA.", image.color_model));
        }
        if image.color_primaries != ColorPrimaries::Aces {
            error(
                log,
                format!("color primaries are `{:?}`, not ACES.", image.color_primaries),
            );
        }
        if image.transfer_characteristic != TransferCharacteristic::Linear {
            error(
                log,
                format!(
                    "transfer characteristic is `{:?}`, not linear.",
                    image.transfer_characteristic
                ),
            );
        }
        if image.sampling != Sampling::Sampling444 {
            error(log, format!("sampling is `{:?}`, not 4:4:4.", image.sampling));
        }
        if image.frame_layout != FrameLayout::FullFrame {
            error(
                log,
                format!("frame layout is `{:?}`, not full frame.", image.frame_layout),
            );
        }
    }
}

impl ApplicationProfileValidator for App5Validator {
    fn constraints_specification(&self) -> &'static str {
        SPECIFICATION
    }

    fn validate_composition_constraints(
        &self,
        composition: &CompositionSummary,
    ) -> Vec<ErrorObject> {
        let mut log = ErrorLog::new();
        for track in composition.tracks_of(VirtualTrackKind::MainImage) {
            check_track_edit_rate(SPECIFICATION, composition, track, &mut log);
            for image in track.resources.iter().filter_map(|r| r.as_image()) {
                self.validate_image(image, &mut log);
            }
        }
        log.into_errors()
    }

    fn validate_track_file_constraints(&self, header: &HeaderPartition) -> Vec<ErrorObject> {
        let mut log = ErrorLog::new();
        let Some(descriptor) = header.top_level_descriptor() else {
            return log.into_errors();
        };
        if descriptor.as_picture_descriptor().is_none() {
            return log.into_errors();
        }

        if let Some(image) = ImageEssenceDescriptorModel::from_descriptor(header, descriptor, &mut log) {
            self.validate_image(&image, &mut log);
        }
        log.into_errors()
    }
}

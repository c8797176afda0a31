//! App #2E (SMPTE ST 2067-21): JPEG 2000 picture.

use imf_validation_types::labels;

use crate::{
    error_log::{ErrorCode, ErrorLevel, ErrorLog, ErrorObject},
    header::HeaderPartition,
    j2k::{
        ht::{HtEdition, validate_ht_constraints},
        profile::J2kProfile,
    },
    profiles::{
        ApplicationProfileValidator, CompositionSummary, VirtualTrackKind, check_track_edit_rate,
        characteristics::{APP2E_2014, APP2E_2016, APP2E_2020, CharacteristicsTable},
        image::ImageEssenceDescriptorModel,
    },
};

/// Which edition of App #2E to check against.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum ProfileEdition {
    Edition2014,
    Edition2016,
    Edition2020,

    /// The 2020 tables, plus high-throughput JPEG 2000.
    Edition2021,
}

impl ProfileEdition {
    pub fn characteristics(&self) -> &'static CharacteristicsTable {
        match self {
            ProfileEdition::Edition2014 => &APP2E_2014,
            ProfileEdition::Edition2016 => &APP2E_2016,
            ProfileEdition::Edition2020 | ProfileEdition::Edition2021 => &APP2E_2020,
        }
    }

    /// The HT constraints to apply, if this edition allows HT at all.
    pub fn ht_edition(&self) -> Option<HtEdition> {
        match self {
            ProfileEdition::Edition2021 => Some(HtEdition::Edition2021),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct App2eValidator {
    edition: ProfileEdition,
}

impl App2eValidator {
    pub const fn new(edition: ProfileEdition) -> Self {
        Self { edition }
    }

    pub fn edition(&self) -> ProfileEdition {
        self.edition
    }

    fn error(&self, log: &mut ErrorLog, level: ErrorLevel, description: String) {
        log.add_error(
            ErrorCode::ApplicationCompositionError,
            level,
            format!("{}: {description}", self.constraints_specification()),
        );
    }

    /// Checks one picture track file's model.
    pub fn validate_image(&self, image: &ImageEssenceDescriptorModel, log: &mut ErrorLog) {
        if !image
            .essence_container
            .equals_ignoring_version(&labels::J2K_FRAME_WRAPPED_CONTAINER)
        {
            self.error(
                log,
                ErrorLevel::NonFatal,
                format!(
                    "essence container `{}` isn't frame-wrapped JPEG 2000.",
                    image.essence_container
                ),
            );
        }

        self.validate_coding(image, log);

        let table = self.edition.characteristics();
        if !table.allows(image) {
            self.error(
                log,
                ErrorLevel::NonFatal,
                format!(
                    "`{}x{}` `{:?}` `{}`-bit `{:?}` `{:?}` `{:?}` `{:?}` picture at `{}` fps doesn't match any characteristics set of {}.",
                    image.stored_width,
                    image.stored_height,
                    image.color_system,
                    image.bit_depth,
                    image.color_model,
                    image.sampling,
                    image.quantization,
                    image.frame_layout,
                    image.sample_rate,
                    table.name
                ),
            );
        }
    }

    fn validate_coding(&self, image: &ImageEssenceDescriptorModel, log: &mut ErrorLog) {
        let Some(coding) = image.picture_coding else {
            self.error(log, ErrorLevel::NonFatal, "picture has no coding label.".into());
            return;
        };

        let profile = J2kProfile::classify(&coding);
        match profile {
            J2kProfile::Unknown => {
                self.error(
                    log,
                    ErrorLevel::NonFatal,
                    format!("picture coding `{coding}` isn't a known JPEG 2000 profile."),
                );
                return;
            }

            J2kProfile::Ht => {
                let Some(ht_edition) = self.edition.ht_edition() else {
                    self.error(
                        log,
                        ErrorLevel::NonFatal,
                        "high-throughput JPEG 2000 isn't allowed in this edition.".into(),
                    );
                    return;
                };

                match &image.j2k {
                    Some(params) => {
                        validate_ht_constraints(params, ht_edition, log);
                    }
                    None => self.error(
                        log,
                        ErrorLevel::NonFatal,
                        "HT picture has no JPEG 2000 sub-descriptor to check.".into(),
                    ),
                }
            }

            J2kProfile::Broadcast(_) | J2kProfile::Imf2k | J2kProfile::Imf4k | J2kProfile::Imf8k => (),
        }

        if !profile.resolution_allowed(image.stored_width, image.stored_height) {
            self.error(
                log,
                ErrorLevel::NonFatal,
                format!(
                    "`{}x{}` is outside the `{profile:?}` profile's resolution range.",
                    image.stored_width, image.stored_height
                ),
            );
        }
    }
}

impl ApplicationProfileValidator for App2eValidator {
    fn constraints_specification(&self) -> &'static str {
        match self.edition {
            ProfileEdition::Edition2014 => "SMPTE ST 2067-21:2014",
            ProfileEdition::Edition2016 => "SMPTE ST 2067-21:2016",
            ProfileEdition::Edition2020 => "SMPTE ST 2067-21:2020",
            ProfileEdition::Edition2021 => "SMPTE ST 2067-21:2020 Am1:2021",
        }
    }

    fn validate_composition_constraints(
        &self,
        composition: &CompositionSummary,
    ) -> Vec<ErrorObject> {
        let mut log = ErrorLog::new();
        let spec = self.constraints_specification();

        let mut image_tracks = composition.tracks_of(VirtualTrackKind::MainImage).peekable();
        if image_tracks.peek().is_none() {
            self.error(&mut log, ErrorLevel::NonFatal, "composition has no main image virtual track.".into());
        }

        for track in image_tracks {
            check_track_edit_rate(spec, composition, track, &mut log);

            let images = track
                .resources
                .iter()
                .filter_map(|r| r.as_image())
                .collect::<Vec<_>>();
            for image in &images {
                self.validate_image(image, &mut log);
            }

            // every resource in the track must look the same
            if let Some((first, rest)) = images.split_first() {
                let differs = rest.iter().any(|other| {
                    other.stored_width != first.stored_width
                        || other.stored_height != first.stored_height
                        || other.color_system != first.color_system
                        || other.bit_depth != first.bit_depth
                        || other.sampling != first.sampling
                        || other.quantization != first.quantization
                        || other.frame_layout != first.frame_layout
                        || !other.sample_rate.same_value(&first.sample_rate)
                });
                if differs {
                    self.error(
                        &mut log,
                        ErrorLevel::NonFatal,
                        "main image virtual track resources don't share one set of essence characteristics.".into(),
                    );
                }
            }
        }

        log.into_errors()
    }

    fn validate_track_file_constraints(&self, header: &HeaderPartition) -> Vec<ErrorObject> {
        let mut log = ErrorLog::new();

        // sound track files aren't this profile's concern
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

#[cfg(test)]
mod tests {
    use imf_validation_types::{
        colorimetry::{
            CodingEquation, ColorModel, ColorPrimaries, Colorimetry, FrameLayout, Quantization,
            Sampling, TransferCharacteristic,
        },
        labels,
        primitives::Rational,
        ul::Ul,
    };

    use super::{App2eValidator, ProfileEdition};
    use crate::{
        error_log::{ErrorCode, ErrorLevel, ErrorLog},
        header::HeaderPartition,
        j2k::{J2kHeaderParameters, tests::HT_DESCRIPTOR_XML},
        profiles::{
            ApplicationProfileValidator, CompositionSummary, ResourceEssence, VirtualTrackKind,
            VirtualTrackSummary, image::ImageEssenceDescriptorModel,
        },
        util::{
            logger,
            mxf_builder::{Essence, MinimalTrackFile, PictureSpec},
        },
    };

    fn coding(family: u8, level: u8) -> Ul {
        let mut ul = labels::J2K_PICTURE_CODING_BASE;
        ul.0[14] = family;
        ul.0[15] = level;
        ul
    }

    fn hd() -> ImageEssenceDescriptorModel {
        ImageEssenceDescriptorModel {
            stored_width: 1920,
            stored_height: 1080,
            color_system: Colorimetry::Color3,
            color_primaries: ColorPrimaries::Itu709,
            transfer_characteristic: TransferCharacteristic::Itu709,
            coding_equation: CodingEquation::Itu709,
            bit_depth: 10,
            frame_layout: FrameLayout::FullFrame,
            sample_rate: Rational::new(24, 1),
            sampling: Sampling::Sampling422,
            quantization: Quantization::Qe1,
            color_model: ColorModel::YCbCr,
            essence_container: labels::J2K_FRAME_WRAPPED_CONTAINER,
            picture_coding: Some(coding(0x03, 0x01)),
            j2k: None,
        }
    }

    fn uhd_ht() -> ImageEssenceDescriptorModel {
        ImageEssenceDescriptorModel {
            stored_width: 3840,
            stored_height: 2160,
            bit_depth: 10,
            sampling: Sampling::Sampling444,
            quantization: Quantization::Qe2,
            color_model: ColorModel::Rgba,
            coding_equation: CodingEquation::None,
            picture_coding: Some(coding(0x08, 0x01)),
            j2k: Some(J2kHeaderParameters::from_xml_str(HT_DESCRIPTOR_XML).unwrap()),
            ..hd()
        }
    }

    #[test]
    fn hd_picture_is_allowed() {
        logger();
        let mut log = ErrorLog::new();
        App2eValidator::new(ProfileEdition::Edition2014).validate_image(&hd(), &mut log);
        assert!(log.is_empty(), "{log}");
    }

    #[test]
    fn table_mismatch_is_one_non_fatal_error() {
        logger();
        let mut log = ErrorLog::new();
        let odd = ImageEssenceDescriptorModel {
            sample_rate: Rational::new(23, 1),
            ..hd()
        };
        App2eValidator::new(ProfileEdition::Edition2020).validate_image(&odd, &mut log);

        assert_eq!(log.len(), 1, "{log}");
        let error = &log.errors()[0];
        assert_eq!(error.level(), ErrorLevel::NonFatal);
        assert_eq!(error.code(), ErrorCode::ApplicationCompositionError);
        assert!(error.description().contains("ST 2067-21:2020"));
    }

    #[test]
    fn ht_needs_the_2021_edition() {
        logger();
        let image = uhd_ht();

        let mut log = ErrorLog::new();
        App2eValidator::new(ProfileEdition::Edition2020).validate_image(&image, &mut log);
        assert_eq!(log.len(), 1, "{log}");
        assert!(log.errors()[0].description().contains("high-throughput"));

        let mut log = ErrorLog::new();
        App2eValidator::new(ProfileEdition::Edition2021).validate_image(&image, &mut log);
        assert!(!log.has_fatal_errors(), "{log}");
        assert!(log.errors_by_level(ErrorLevel::NonFatal, None).is_empty(), "{log}");
    }

    #[test]
    fn imf_profile_resolution_is_checked() {
        logger();
        let mut log = ErrorLog::new();
        let image = ImageEssenceDescriptorModel {
            picture_coding: Some(coding(0x05, 0x02)),
            ..hd()
        };
        App2eValidator::new(ProfileEdition::Edition2016).validate_image(&image, &mut log);
        assert_eq!(log.len(), 1, "{log}");
        assert!(log.errors()[0].description().contains("Imf4k"));
    }

    #[test]
    fn composition_edit_rate_and_homogeneity() {
        logger();
        let composition = CompositionSummary {
            edit_rate: Rational::new(24, 1),
            virtual_tracks: vec![VirtualTrackSummary {
                kind: VirtualTrackKind::MainImage,
                edit_rate: Rational::new(25, 1),
                resources: vec![
                    ResourceEssence::Image(hd()),
                    ResourceEssence::Image(ImageEssenceDescriptorModel {
                        bit_depth: 8,
                        ..hd()
                    }),
                ],
            }],
        };

        let errors = App2eValidator::new(ProfileEdition::Edition2014)
            .validate_composition_constraints(&composition);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].description().contains("edit rate"));
        assert!(errors[1].description().contains("share"));
    }

    #[test]
    fn picture_track_file() {
        logger();
        let built = MinimalTrackFile {
            essence: Essence::Picture(PictureSpec::default()),
            ..Default::default()
        }
        .build();
        let mut log = ErrorLog::new();
        let header = HeaderPartition::from_provider(
            &built.bytes,
            built.header_offset,
            built.header_length,
            &mut log,
        )
        .unwrap();

        let validator = App2eValidator::new(ProfileEdition::Edition2014);
        let errors = validator.validate_track_file_constraints(&header);
        assert!(errors.is_empty(), "{errors:?}");

        let deep = MinimalTrackFile {
            essence: Essence::Picture(PictureSpec {
                component_depth: 16,
                ..Default::default()
            }),
            ..Default::default()
        }
        .build();
        let header = HeaderPartition::from_provider(
            &deep.bytes,
            deep.header_offset,
            deep.header_length,
            &mut log,
        )
        .unwrap();
        assert_eq!(validator.validate_track_file_constraints(&header).len(), 1);
    }

    #[test]
    fn sound_track_files_are_skipped() {
        logger();
        let built = MinimalTrackFile::default().build();
        let mut log = ErrorLog::new();
        let header = HeaderPartition::from_provider(
            &built.bytes,
            built.header_offset,
            built.header_length,
            &mut log,
        )
        .unwrap();
        let errors =
            App2eValidator::new(ProfileEdition::Edition2020).validate_track_file_constraints(&header);
        assert!(errors.is_empty());
    }
}

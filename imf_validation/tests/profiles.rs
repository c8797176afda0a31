use std::sync::Arc;

use imf_validation::{
    error_log::{ErrorCode, ErrorLevel},
    profiles::{
        ApplicationProfileValidator, CompositionSummary, ResourceEssence, ValidatorRegistry,
        VirtualTrackKind, VirtualTrackSummary,
        app2e::{App2eValidator, ProfileEdition},
        image::ImageEssenceDescriptorModel,
    },
};
use imf_validation_types::{
    colorimetry::{
        CodingEquation, ColorModel, ColorPrimaries, Colorimetry, FrameLayout, Quantization,
        Sampling, TransferCharacteristic,
    },
    labels,
    primitives::Rational,
};

fn logger() {
    _ = env_logger::builder()
        .filter_level(log::LevelFilter::max())
        .format_file(true)
        .format_line_number(true)
        .try_init();
}

/// An HD 4:2:2 picture using the 2K IMF profile.
fn hd_picture() -> ImageEssenceDescriptorModel {
    let mut coding = labels::J2K_PICTURE_CODING_BASE;
    coding.0[14] = 0x03;
    coding.0[15] = 0x01;

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
        picture_coding: Some(coding),
        j2k: None,
    }
}

fn composition(images: Vec<ImageEssenceDescriptorModel>) -> CompositionSummary {
    CompositionSummary {
        edit_rate: Rational::new(24, 1),
        virtual_tracks: vec![VirtualTrackSummary {
            kind: VirtualTrackKind::MainImage,
            edit_rate: Rational::new(24, 1),
            resources: images.into_iter().map(ResourceEssence::Image).collect(),
        }],
    }
}

/// Every built-in profile is registered, and lookups ignore case.
#[test]
fn default_registry() {
    logger();
    let registry = ValidatorRegistry::with_default_profiles();
    assert_eq!(registry.len(), 7);

    for namespace in [
        ValidatorRegistry::APP2E_2014,
        ValidatorRegistry::APP2E_2016,
        ValidatorRegistry::APP2E_2020,
        ValidatorRegistry::APP2E_2021,
        ValidatorRegistry::APP5_ACES,
        ValidatorRegistry::IAB,
        ValidatorRegistry::MGA,
    ] {
        assert!(registry.get(namespace).is_some(), "missing `{namespace}`");
        assert!(registry.get(&namespace.to_ascii_uppercase()).is_some());
    }

    let app2e = registry.get(ValidatorRegistry::APP2E_2016).unwrap();
    assert_eq!(app2e.constraints_specification(), "SMPTE ST 2067-21:2016");
}

#[test]
fn registering_replaces_the_old_profile() {
    logger();
    let mut registry = ValidatorRegistry::new();
    assert!(registry.is_empty());

    registry.register(
        "urn:example:profile",
        Arc::new(App2eValidator::new(ProfileEdition::Edition2014)),
    );
    registry.register(
        "URN:EXAMPLE:PROFILE",
        Arc::new(App2eValidator::new(ProfileEdition::Edition2020)),
    );

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.namespaces(), vec!["urn:example:profile"]);
    assert_eq!(
        registry
            .get("urn:example:profile")
            .unwrap()
            .constraints_specification(),
        "SMPTE ST 2067-21:2020"
    );
}

#[test]
fn hd_composition_passes_every_app2e_edition() {
    logger();
    let registry = ValidatorRegistry::with_default_profiles();
    let log = registry.validate_composition(
        &[
            ValidatorRegistry::APP2E_2014,
            ValidatorRegistry::APP2E_2016,
            ValidatorRegistry::APP2E_2020,
            ValidatorRegistry::APP2E_2021,
        ],
        &composition(vec![hd_picture()]),
    );
    assert!(log.is_empty(), "{log}");
}

/// Audio profiles have nothing to say about a picture-only composition.
#[test]
fn audio_profiles_skip_picture_tracks() {
    logger();
    let registry = ValidatorRegistry::with_default_profiles();
    let log = registry.validate_composition(
        &[ValidatorRegistry::IAB, ValidatorRegistry::MGA],
        &composition(vec![hd_picture()]),
    );
    assert!(log.is_empty(), "{log}");
}

#[test]
fn unknown_namespace_is_non_fatal() {
    logger();
    let registry = ValidatorRegistry::with_default_profiles();
    let log = registry.validate_composition(
        &["http://example.com/not-a-profile", ValidatorRegistry::APP2E_2014],
        &composition(vec![hd_picture()]),
    );

    assert_eq!(log.len(), 1, "{log}");
    let error = &log.errors()[0];
    assert_eq!(error.level(), ErrorLevel::NonFatal);
    assert_eq!(error.code(), ErrorCode::ApplicationCompositionError);
    assert!(!log.has_fatal_errors());
}

/// Problems from every profile end up in one log.
#[test]
fn problems_are_collected_across_profiles() {
    logger();
    let registry = ValidatorRegistry::with_default_profiles();
    let odd = ImageEssenceDescriptorModel {
        sample_rate: Rational::new(23, 1),
        ..hd_picture()
    };

    let log = registry.validate_composition(
        &[ValidatorRegistry::APP2E_2014, ValidatorRegistry::APP2E_2020],
        &composition(vec![odd]),
    );

    assert_eq!(log.len(), 2, "{log}");
    assert_eq!(log.errors_by_level(ErrorLevel::NonFatal, None).len(), 2);
    assert!(log.errors()[0].description().contains("ST 2067-21:2014"));
    assert!(log.errors()[1].description().contains("ST 2067-21:2020"));
}

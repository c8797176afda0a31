//! A picture track file's essence characteristics.

use imf_validation_types::{
    colorimetry::{
        CodingEquation, ColorModel, ColorPrimaries, Colorimetry, FrameLayout, Quantization,
        Sampling, TransferCharacteristic,
    },
    primitives::Rational,
    sets::SetKind,
    ul::Ul,
};

use crate::{
    error_log::{ErrorCode, ErrorLevel, ErrorLog},
    header::{
        HeaderPartition,
        objects::{MetadataSet, SetBody},
    },
    j2k::J2kHeaderParameters,
};

/// Everything the application profiles need to know about a picture
/// descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageEssenceDescriptorModel {
    pub stored_width: u32,
    pub stored_height: u32,
    pub color_system: Colorimetry,
    pub color_primaries: ColorPrimaries,
    pub transfer_characteristic: TransferCharacteristic,
    pub coding_equation: CodingEquation,
    pub bit_depth: u32,
    pub frame_layout: FrameLayout,
    pub sample_rate: Rational,
    pub sampling: Sampling,
    pub quantization: Quantization,
    pub color_model: ColorModel,
    pub essence_container: Ul,
    pub picture_coding: Option<Ul>,
    pub j2k: Option<J2kHeaderParameters>,
}

fn metadata_error(log: &mut ErrorLog, level: ErrorLevel, description: String) {
    log.add_error(ErrorCode::ImfEssenceMetadataError, level, description);
}

impl ImageEssenceDescriptorModel {
    /// Builds the model from the top-level file package's descriptor.
    pub fn from_header(header: &HeaderPartition, log: &mut ErrorLog) -> Option<Self> {
        match header.top_level_descriptor() {
            Some(d) => Self::from_descriptor(header, d, log),
            None => {
                metadata_error(
                    log,
                    ErrorLevel::Fatal,
                    "The top-level file package has no essence descriptor.".into(),
                );
                None
            }
        }
    }

    /// Builds the model from a CDCI or RGBA descriptor.
    ///
    /// Values that can't be worked out are logged and left as `Unknown`.
    pub fn from_descriptor(
        header: &HeaderPartition,
        descriptor: &MetadataSet,
        log: &mut ErrorLog,
    ) -> Option<Self> {
        let Some(picture) = descriptor.as_picture_descriptor() else {
            metadata_error(
                log,
                ErrorLevel::Fatal,
                format!("`{}` isn't a picture descriptor.", descriptor.kind.name()),
            );
            return None;
        };

        let color_primaries = picture
            .color_primaries
            .as_ref()
            .map_or(ColorPrimaries::Unknown, ColorPrimaries::from_ul);
        let transfer_characteristic = picture
            .transfer_characteristic
            .as_ref()
            .map_or(TransferCharacteristic::Unknown, TransferCharacteristic::from_ul);
        if color_primaries == ColorPrimaries::Unknown {
            metadata_error(
                log,
                ErrorLevel::NonFatal,
                "Picture descriptor has no recognized color primaries.".into(),
            );
        }
        if transfer_characteristic == TransferCharacteristic::Unknown {
            metadata_error(
                log,
                ErrorLevel::NonFatal,
                "Picture descriptor has no recognized transfer characteristic.".into(),
            );
        }

        let j2k = header
            .sub_descriptors(descriptor)
            .into_iter()
            .find(|s| s.kind == SetKind::Jpeg2000PictureSubDescriptor)
            .and_then(MetadataSet::as_jpeg2000_sub_descriptor)
            .and_then(|sub| match J2kHeaderParameters::from_sub_descriptor(sub) {
                Ok(p) => Some(p),
                Err(e) => {
                    metadata_error(
                        log,
                        ErrorLevel::Fatal,
                        format!("Couldn't decode the JPEG 2000 sub-descriptor. err: {e}"),
                    );
                    None
                }
            });

        let (bit_depth, sampling, quantization, color_model, coding_equation, color_system) =
            match &descriptor.body {
                SetBody::CdciDescriptor(cdci) => {
                    let bit_depth = cdci.component_depth;
                    let sampling = Sampling::from_subsampling(
                        cdci.horizontal_subsampling,
                        cdci.vertical_subsampling.unwrap_or(1),
                    );
                    let quantization = match (cdci.black_ref_level, cdci.white_ref_level) {
                        (Some(black), Some(white)) => {
                            Quantization::from_levels(bit_depth, black, white)
                        }
                        _ => Quantization::Unknown,
                    };
                    let coding = CodingEquation::from_ul(picture.coding_equations.as_ref());
                    let color = Colorimetry::from_triple(
                        color_primaries,
                        transfer_characteristic,
                        coding,
                    );
                    (bit_depth, sampling, quantization, ColorModel::YCbCr, coding, color)
                }

                SetBody::RgbaDescriptor(rgba) => {
                    let (bit_depth, quantization) =
                        match (rgba.component_min_ref, rgba.component_max_ref) {
                            (Some(min), Some(max)) => {
                                let depth = Quantization::component_range_to_bit_depth(min, max);
                                (depth, Quantization::from_levels(depth, min, max))
                            }
                            _ => (0, Quantization::Unknown),
                        };
                    // the codestream knows the depth even when the ref levels don't
                    let bit_depth = match (bit_depth, j2k.as_ref()) {
                        (0, Some(p)) => p.uniform_bit_depth().map_or(0, u32::from),
                        // ACES is always half-float
                        (0, None) if color_primaries == ColorPrimaries::Aces => 16,
                        _ => bit_depth,
                    };
                    let color = Colorimetry::from_pair(color_primaries, transfer_characteristic);
                    (
                        bit_depth,
                        Sampling::Sampling444,
                        quantization,
                        ColorModel::Rgba,
                        color.coding_equation(),
                        color,
                    )
                }

                _ => return None,
            };

        if bit_depth == 0 {
            metadata_error(
                log,
                ErrorLevel::NonFatal,
                "Couldn't work out the picture's bit depth.".into(),
            );
        }

        let frame_layout = picture
            .frame_layout
            .map_or(FrameLayout::Unknown, FrameLayout::from_u8);

        log::debug!(
            "Image model: `{}x{}`, `{color_system:?}`, `{bit_depth}` bits, `{sampling:?}`, `{quantization:?}`.",
            picture.stored_width,
            picture.stored_height
        );

        Some(ImageEssenceDescriptorModel {
            stored_width: picture.stored_width,
            stored_height: picture.stored_height,
            color_system,
            color_primaries,
            transfer_characteristic,
            coding_equation,
            bit_depth,
            frame_layout,
            sample_rate: picture.file.sample_rate,
            sampling,
            quantization,
            color_model,
            essence_container: picture.file.essence_container,
            picture_coding: picture.picture_compression,
            j2k,
        })
    }
}

//! The image characteristics each App #2E edition allows.
//!
//! A picture is allowed if it fits at least one row. Within a row, width and
//! height are upper bounds, and every other value must be one of the row's
//! listed values. Frame rates compare as exact rationals, so `30000/1001`
//! isn't `30`.

use imf_validation_types::{
    colorimetry::{ColorModel, Colorimetry, FrameLayout, Quantization, Sampling},
    primitives::Rational,
};

use crate::profiles::image::ImageEssenceDescriptorModel;

/// One row of allowed characteristics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacteristicsSet {
    pub max_width: u32,
    pub max_height: u32,
    pub color_systems: &'static [Colorimetry],
    pub bit_depths: &'static [u32],
    pub frame_layouts: &'static [FrameLayout],
    pub frame_rates: &'static [Rational],
    pub samplings: &'static [Sampling],
    pub quantizations: &'static [Quantization],
    pub color_models: &'static [ColorModel],
}

impl CharacteristicsSet {
    #[expect(clippy::too_many_arguments)]
    pub fn has(
        &self,
        width: u32,
        height: u32,
        color_system: Colorimetry,
        bit_depth: u32,
        frame_layout: FrameLayout,
        frame_rate: Rational,
        sampling: Sampling,
        quantization: Quantization,
        color_model: ColorModel,
    ) -> bool {
        width <= self.max_width
            && height <= self.max_height
            && self.color_systems.contains(&color_system)
            && self.bit_depths.contains(&bit_depth)
            && self.frame_layouts.contains(&frame_layout)
            && self.frame_rates.iter().any(|r| r.same_value(&frame_rate))
            && self.samplings.contains(&sampling)
            && self.quantizations.contains(&quantization)
            && self.color_models.contains(&color_model)
    }
}

/// Every row allowed by one edition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacteristicsTable {
    pub name: &'static str,
    pub rows: &'static [CharacteristicsSet],
}

impl CharacteristicsTable {
    #[expect(clippy::too_many_arguments)]
    pub fn has(
        &self,
        width: u32,
        height: u32,
        color_system: Colorimetry,
        bit_depth: u32,
        frame_layout: FrameLayout,
        frame_rate: Rational,
        sampling: Sampling,
        quantization: Quantization,
        color_model: ColorModel,
    ) -> bool {
        self.rows.iter().any(|row| {
            row.has(
                width,
                height,
                color_system,
                bit_depth,
                frame_layout,
                frame_rate,
                sampling,
                quantization,
                color_model,
            )
        })
    }

    /// Whether a picture fits any row.
    pub fn allows(&self, image: &ImageEssenceDescriptorModel) -> bool {
        self.has(
            image.stored_width,
            image.stored_height,
            image.color_system,
            image.bit_depth,
            image.frame_layout,
            image.sample_rate,
            image.sampling,
            image.quantization,
            image.color_model,
        )
    }
}

//
// shared value lists
//

const fn r(numerator: i32, denominator: i32) -> Rational {
    Rational::new(numerator, denominator)
}

const RATES_525: &[Rational] = &[r(30000, 1001)];
const RATES_625: &[Rational] = &[r(25, 1)];
const RATES_INTERLACED_HD: &[Rational] = &[r(25, 1), r(30000, 1001)];
const RATES_HD: &[Rational] = &[
    r(24000, 1001),
    r(24, 1),
    r(25, 1),
    r(30000, 1001),
    r(30, 1),
    r(50, 1),
    r(60000, 1001),
    r(60, 1),
];
const RATES_HFR: &[Rational] = &[
    r(24000, 1001),
    r(24, 1),
    r(25, 1),
    r(30000, 1001),
    r(30, 1),
    r(48, 1),
    r(50, 1),
    r(60000, 1001),
    r(60, 1),
    r(100, 1),
    r(120000, 1001),
    r(120, 1),
];

const FULL_FRAME: &[FrameLayout] = &[FrameLayout::FullFrame];
const FIELDS: &[FrameLayout] = &[FrameLayout::SeparateFields];

const S422: &[Sampling] = &[Sampling::Sampling422];
const S444: &[Sampling] = &[Sampling::Sampling444];
const S422_444: &[Sampling] = &[Sampling::Sampling422, Sampling::Sampling444];

const QE1: &[Quantization] = &[Quantization::Qe1];
const QE1_QE2: &[Quantization] = &[Quantization::Qe1, Quantization::Qe2];

const YCBCR: &[ColorModel] = &[ColorModel::YCbCr];
const RGBA: &[ColorModel] = &[ColorModel::Rgba];

const fn row(
    max_width: u32,
    max_height: u32,
    color_systems: &'static [Colorimetry],
    bit_depths: &'static [u32],
    frame_layouts: &'static [FrameLayout],
    frame_rates: &'static [Rational],
    samplings: &'static [Sampling],
    quantizations: &'static [Quantization],
    color_models: &'static [ColorModel],
) -> CharacteristicsSet {
    CharacteristicsSet {
        max_width,
        max_height,
        color_systems,
        bit_depths,
        frame_layouts,
        frame_rates,
        samplings,
        quantizations,
        color_models,
    }
}

use Colorimetry::{Color1, Color2, Color3, Color4, Color5, Color6, Color7, Color8};

const SD_ROWS: [CharacteristicsSet; 2] = [
    row(720, 486, &[Color1], &[8, 10], FIELDS, RATES_525, S422, QE1, YCBCR),
    row(720, 576, &[Color2], &[8, 10], FIELDS, RATES_625, S422, QE1, YCBCR),
];

pub static APP2E_2014: CharacteristicsTable = CharacteristicsTable {
    name: "ST 2067-21:2014",
    rows: &[
        SD_ROWS[0],
        SD_ROWS[1],
        row(1920, 1080, &[Color3], &[8, 10], FIELDS, RATES_INTERLACED_HD, S422, QE1, YCBCR),
        row(1920, 1080, &[Color3], &[8, 10], FULL_FRAME, RATES_HD, S422, QE1, YCBCR),
        row(1920, 1080, &[Color3], &[8, 10], FULL_FRAME, RATES_HD, S444, QE1_QE2, RGBA),
        row(3840, 2160, &[Color3, Color5], &[10, 12], FULL_FRAME, RATES_HD, S422, QE1, YCBCR),
        row(3840, 2160, &[Color3, Color5], &[10, 12], FULL_FRAME, RATES_HD, S444, QE1_QE2, RGBA),
        row(4096, 3112, &[Color3, Color5], &[10, 12], FULL_FRAME, RATES_HD, S444, QE1_QE2, RGBA),
    ],
};

pub static APP2E_2016: CharacteristicsTable = CharacteristicsTable {
    name: "ST 2067-21:2016",
    rows: &[
        SD_ROWS[0],
        SD_ROWS[1],
        row(1920, 1080, &[Color3, Color4], &[8, 10], FIELDS, RATES_INTERLACED_HD, S422, QE1, YCBCR),
        row(1920, 1080, &[Color3, Color4], &[8, 10], FULL_FRAME, RATES_HD, S422_444, QE1, YCBCR),
        row(1920, 1080, &[Color3], &[8, 10, 12], FULL_FRAME, RATES_HD, S444, QE1_QE2, RGBA),
        row(3840, 2160, &[Color3, Color5], &[10, 12], FULL_FRAME, RATES_HD, S422_444, QE1, YCBCR),
        row(4096, 3112, &[Color3, Color5, Color6], &[10, 12, 16], FULL_FRAME, RATES_HD, S444, QE1_QE2, RGBA),
    ],
};

pub static APP2E_2020: CharacteristicsTable = CharacteristicsTable {
    name: "ST 2067-21:2020",
    rows: &[
        SD_ROWS[0],
        SD_ROWS[1],
        row(1920, 1080, &[Color3, Color4], &[8, 10], FIELDS, RATES_INTERLACED_HD, S422, QE1, YCBCR),
        row(1920, 1080, &[Color3, Color4, Color5, Color7, Color8], &[8, 10, 12], FULL_FRAME, RATES_HFR, S422_444, QE1_QE2, YCBCR),
        row(1920, 1080, &[Color3, Color5, Color6, Color7], &[8, 10, 12, 16], FULL_FRAME, RATES_HFR, S444, QE1_QE2, RGBA),
        row(3840, 2160, &[Color3, Color5, Color7, Color8], &[10, 12], FULL_FRAME, RATES_HFR, S422_444, QE1_QE2, YCBCR),
        row(4096, 3112, &[Color3, Color5, Color6, Color7, Color8], &[10, 12, 16], FULL_FRAME, RATES_HFR, S444, QE1_QE2, RGBA),
        row(7680, 4320, &[Color5, Color7, Color8], &[10, 12], FULL_FRAME, RATES_HFR, S422_444, QE1_QE2, YCBCR),
        row(8192, 6224, &[Color5, Color6, Color7, Color8], &[10, 12, 16], FULL_FRAME, RATES_HFR, S444, QE1_QE2, RGBA),
    ],
};

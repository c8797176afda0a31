//! Colour tables for picture essence.
//!
//! Picture descriptors name their colour primaries, transfer characteristic,
//! and coding equations with ULs. Application profiles talk about "colour
//! systems" instead (`Color1` to `Color8`), so these tables translate between
//! the two. Quantization and sampling get the same treatment.
//!
//! Nothing in here fails: anything not in a table comes back as `Unknown`.

use crate::ul::Ul;

/// Colour primaries, from `060e2b34.04010106.04010101.03XX0000`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum ColorPrimaries {
    Itu601_525,
    Itu601_625,
    Itu709,
    Itu2020,
    P3D65,
    Aces,
    Unknown,
}

const COLOR_PRIMARIES: &[(ColorPrimaries, u128)] = &[
    (ColorPrimaries::Itu601_525, 0x060e2b34_04010106_04010101_03010000),
    (ColorPrimaries::Itu601_625, 0x060e2b34_04010106_04010101_03020000),
    (ColorPrimaries::Itu709, 0x060e2b34_04010106_04010101_03030000),
    (ColorPrimaries::Itu2020, 0x060e2b34_04010106_04010101_03040000),
    (ColorPrimaries::P3D65, 0x060e2b34_0401010d_04010101_03060000),
    (ColorPrimaries::Aces, 0x060e2b34_0401010d_04010101_03070000),
];

/// Transfer characteristics, from `060e2b34.04010101.04010101.01XX0000`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum TransferCharacteristic {
    Itu709,
    Linear,
    /// IEC 61966-2-4 (xvYCC).
    Iec6196624,
    Itu2020,
    SmpteSt2084,
    Hlg,
    Unknown,
}

const TRANSFER_CHARACTERISTICS: &[(TransferCharacteristic, u128)] = &[
    (TransferCharacteristic::Itu709, 0x060e2b34_04010101_04010101_01020000),
    (TransferCharacteristic::Linear, 0x060e2b34_04010106_04010101_01060000),
    (TransferCharacteristic::Iec6196624, 0x060e2b34_04010108_04010101_01080000),
    (TransferCharacteristic::Itu2020, 0x060e2b34_0401010e_04010101_01090000),
    (TransferCharacteristic::SmpteSt2084, 0x060e2b34_0401010d_04010101_010a0000),
    (TransferCharacteristic::Hlg, 0x060e2b34_0401010d_04010101_010b0000),
];

/// Coding equations, from `060e2b34.04010101.04010101.02XX0000`.
///
/// RGB pictures don't have coding equations, which is what `None` is for.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum CodingEquation {
    Itu601,
    Itu709,
    Itu2020Ncl,
    None,
    Unknown,
}

const CODING_EQUATIONS: &[(CodingEquation, u128)] = &[
    (CodingEquation::Itu601, 0x060e2b34_04010101_04010101_02010000),
    (CodingEquation::Itu709, 0x060e2b34_04010101_04010101_02020000),
    (CodingEquation::Itu2020Ncl, 0x060e2b34_0401010d_04010101_02060000),
];

/// Finds `ul` in a label table, ignoring the version byte.
fn find_label<T: Copy>(table: &[(T, u128)], ul: &Ul) -> Option<T> {
    table
        .iter()
        .find(|(_, label)| Ul::from_u128(*label).equals_ignoring_version(ul))
        .map(|(value, _)| *value)
}

impl ColorPrimaries {
    pub fn from_ul(ul: &Ul) -> Self {
        find_label(COLOR_PRIMARIES, ul).unwrap_or(Self::Unknown)
    }

    pub fn ul(&self) -> Option<Ul> {
        COLOR_PRIMARIES
            .iter()
            .find(|(v, _)| v == self)
            .map(|(_, label)| Ul::from_u128(*label))
    }
}

impl TransferCharacteristic {
    pub fn from_ul(ul: &Ul) -> Self {
        find_label(TRANSFER_CHARACTERISTICS, ul).unwrap_or(Self::Unknown)
    }

    pub fn ul(&self) -> Option<Ul> {
        TRANSFER_CHARACTERISTICS
            .iter()
            .find(|(v, _)| v == self)
            .map(|(_, label)| Ul::from_u128(*label))
    }
}

impl CodingEquation {
    /// Classifies an optional coding equations label. A missing label is
    /// [`CodingEquation::None`].
    pub fn from_ul(ul: Option<&Ul>) -> Self {
        match ul {
            Some(ul) => find_label(CODING_EQUATIONS, ul).unwrap_or(Self::Unknown),
            None => Self::None,
        }
    }

    pub fn ul(&self) -> Option<Ul> {
        CODING_EQUATIONS
            .iter()
            .find(|(v, _)| v == self)
            .map(|(_, label)| Ul::from_u128(*label))
    }
}

/// A named colour system, as application profiles list them.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum Colorimetry {
    Color1,
    Color2,
    Color3,
    Color4,
    Color5,
    Color6,
    Color7,
    Color8,
    Unknown,
}

/// Each colour system's (primaries, transfer, coding equation) triple.
const COLORIMETRY: &[(
    Colorimetry,
    ColorPrimaries,
    TransferCharacteristic,
    CodingEquation,
)] = &[
    (
        Colorimetry::Color1,
        ColorPrimaries::Itu601_525,
        TransferCharacteristic::Itu709,
        CodingEquation::Itu601,
    ),
    (
        Colorimetry::Color2,
        ColorPrimaries::Itu601_625,
        TransferCharacteristic::Itu709,
        CodingEquation::Itu601,
    ),
    (
        Colorimetry::Color3,
        ColorPrimaries::Itu709,
        TransferCharacteristic::Itu709,
        CodingEquation::Itu709,
    ),
    (
        Colorimetry::Color4,
        ColorPrimaries::Itu709,
        TransferCharacteristic::Iec6196624,
        CodingEquation::Itu709,
    ),
    (
        Colorimetry::Color5,
        ColorPrimaries::Itu2020,
        TransferCharacteristic::Itu2020,
        CodingEquation::Itu2020Ncl,
    ),
    (
        Colorimetry::Color6,
        ColorPrimaries::P3D65,
        TransferCharacteristic::SmpteSt2084,
        CodingEquation::None,
    ),
    (
        Colorimetry::Color7,
        ColorPrimaries::Itu2020,
        TransferCharacteristic::SmpteSt2084,
        CodingEquation::Itu2020Ncl,
    ),
    (
        Colorimetry::Color8,
        ColorPrimaries::Itu2020,
        TransferCharacteristic::Hlg,
        CodingEquation::Itu2020Ncl,
    ),
];

impl Colorimetry {
    /// Finds the colour system for a primaries + transfer pair.
    ///
    /// RGB descriptors carry no coding equations, so this is how they get
    /// classified. Use [`Colorimetry::coding_equation`] to see which equation
    /// the result implies.
    ///
    /// ```
    /// use imf_validation_types::colorimetry::{
    ///     CodingEquation, ColorPrimaries, Colorimetry, TransferCharacteristic,
    /// };
    ///
    /// let c = Colorimetry::from_pair(ColorPrimaries::Itu709, TransferCharacteristic::Itu709);
    /// assert_eq!(c, Colorimetry::Color3);
    /// assert_eq!(c.coding_equation(), CodingEquation::Itu709);
    /// ```
    pub fn from_pair(primaries: ColorPrimaries, transfer: TransferCharacteristic) -> Self {
        COLORIMETRY
            .iter()
            .find(|(_, p, t, _)| *p == primaries && *t == transfer)
            .map(|(c, ..)| *c)
            .unwrap_or(Colorimetry::Unknown)
    }

    /// Finds the colour system matching all three values exactly.
    pub fn from_triple(
        primaries: ColorPrimaries,
        transfer: TransferCharacteristic,
        coding: CodingEquation,
    ) -> Self {
        COLORIMETRY
            .iter()
            .find(|(_, p, t, e)| *p == primaries && *t == transfer && *e == coding)
            .map(|(c, ..)| *c)
            .unwrap_or(Colorimetry::Unknown)
    }

    pub fn color_primaries(&self) -> ColorPrimaries {
        self.row().map_or(ColorPrimaries::Unknown, |r| r.1)
    }

    pub fn transfer_characteristic(&self) -> TransferCharacteristic {
        self.row().map_or(TransferCharacteristic::Unknown, |r| r.2)
    }

    pub fn coding_equation(&self) -> CodingEquation {
        self.row().map_or(CodingEquation::Unknown, |r| r.3)
    }

    fn row(
        &self,
    ) -> Option<&'static (
        Colorimetry,
        ColorPrimaries,
        TransferCharacteristic,
        CodingEquation,
    )> {
        COLORIMETRY.iter().find(|r| r.0 == *self)
    }
}

/// How sample values map onto signal levels.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum Quantization {
    /// Narrow ("video") range: `16 << (b - 8)` to `235 << (b - 8)`.
    Qe1,
    /// Full range: `0` to `2^b - 1`.
    Qe2,
    Unknown,
}

/// The bit depths quantization levels are registered for.
const QUANTIZATION_BIT_DEPTHS: [u32; 4] = [8, 10, 12, 16];

impl Quantization {
    /// The (min, max) levels of this quantization at a given bit depth.
    pub const fn levels(&self, bit_depth: u32) -> Option<(u32, u32)> {
        if bit_depth < 8 || bit_depth > 16 {
            return None;
        }
        match self {
            Quantization::Qe1 => Some((16 << (bit_depth - 8), 235 << (bit_depth - 8))),
            Quantization::Qe2 => Some((0, (1 << bit_depth) - 1)),
            Quantization::Unknown => None,
        }
    }

    /// Classifies a (min, max) level pair at a known bit depth.
    pub fn from_levels(bit_depth: u32, min: u32, max: u32) -> Self {
        [Quantization::Qe1, Quantization::Qe2]
            .into_iter()
            .find(|q| q.levels(bit_depth) == Some((min, max)))
            .unwrap_or(Quantization::Unknown)
    }

    /// Finds the bit depth a (min, max) level pair implies.
    ///
    /// Returns `0` when no registered level matches, or when more than one
    /// does.
    ///
    /// ```
    /// use imf_validation_types::colorimetry::Quantization;
    ///
    /// assert_eq!(Quantization::component_range_to_bit_depth(16, 235), 8);
    /// assert_eq!(Quantization::component_range_to_bit_depth(0, 1023), 10);
    /// assert_eq!(Quantization::component_range_to_bit_depth(1, 2), 0);
    /// ```
    pub fn component_range_to_bit_depth(min: u32, max: u32) -> u32 {
        let mut matches = QUANTIZATION_BIT_DEPTHS.iter().flat_map(|depth| {
            [Quantization::Qe1, Quantization::Qe2]
                .into_iter()
                .filter(move |q| q.levels(*depth) == Some((min, max)))
                .map(move |_| *depth)
        });

        match (matches.next(), matches.next()) {
            (Some(depth), None) => depth,
            _ => 0,
        }
    }
}

/// Chroma subsampling.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum Sampling {
    Sampling444,
    Sampling422,
    Sampling420,
    Unknown,
}

impl Sampling {
    /// Classifies horizontal/vertical subsampling factors.
    pub const fn from_subsampling(horizontal: u32, vertical: u32) -> Self {
        match (horizontal, vertical) {
            (1, 1) => Sampling::Sampling444,
            (2, 1) => Sampling::Sampling422,
            (2, 2) => Sampling::Sampling420,
            _ => Sampling::Unknown,
        }
    }
}

/// A picture descriptor's frame layout.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum FrameLayout {
    FullFrame,
    SeparateFields,
    SingleField,
    MixedFields,
    SegmentedFrame,
    Unknown,
}

impl FrameLayout {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => FrameLayout::FullFrame,
            1 => FrameLayout::SeparateFields,
            2 => FrameLayout::SingleField,
            3 => FrameLayout::MixedFields,
            4 => FrameLayout::SegmentedFrame,
            _ => FrameLayout::Unknown,
        }
    }
}

/// Whether a picture is RGB or colour difference.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum ColorModel {
    Rgba,
    YCbCr,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_labels_round_trip() {
        for (p, _) in COLOR_PRIMARIES {
            let ul = p.ul().unwrap();
            assert_eq!(ColorPrimaries::from_ul(&ul), *p);
        }
        assert_eq!(ColorPrimaries::Unknown.ul(), None);
    }

    #[test]
    fn version_byte_is_ignored() {
        let mut ul = TransferCharacteristic::Hlg.ul().unwrap();
        ul.0[7] = 0x01;
        assert_eq!(TransferCharacteristic::from_ul(&ul), TransferCharacteristic::Hlg);
    }

    #[test]
    fn unknown_colour_systems() {
        assert_eq!(
            Colorimetry::from_pair(ColorPrimaries::Aces, TransferCharacteristic::Itu709),
            Colorimetry::Unknown
        );
        assert_eq!(
            Colorimetry::from_triple(
                ColorPrimaries::Itu709,
                TransferCharacteristic::Itu709,
                CodingEquation::Itu601
            ),
            Colorimetry::Unknown
        );
        assert_eq!(Colorimetry::Unknown.coding_equation(), CodingEquation::Unknown);
        assert_eq!(CodingEquation::from_ul(None), CodingEquation::None);
    }

    #[test]
    fn triples() {
        assert_eq!(
            Colorimetry::from_triple(
                ColorPrimaries::Itu2020,
                TransferCharacteristic::Hlg,
                CodingEquation::Itu2020Ncl
            ),
            Colorimetry::Color8
        );
        assert_eq!(
            Colorimetry::from_triple(
                ColorPrimaries::P3D65,
                TransferCharacteristic::SmpteSt2084,
                CodingEquation::None
            ),
            Colorimetry::Color6
        );
    }

    #[test]
    fn quantization_levels() {
        assert_eq!(Quantization::from_levels(10, 64, 940), Quantization::Qe1);
        assert_eq!(Quantization::from_levels(12, 0, 4095), Quantization::Qe2);
        assert_eq!(Quantization::from_levels(10, 0, 940), Quantization::Unknown);
        assert_eq!(Quantization::Qe1.levels(7), None);

        assert_eq!(Quantization::component_range_to_bit_depth(16, 235), 8);
        assert_eq!(Quantization::component_range_to_bit_depth(0, 255), 8);
        assert_eq!(Quantization::component_range_to_bit_depth(4096, 60160), 16);
        assert_eq!(Quantization::component_range_to_bit_depth(0, 0), 0);
    }

    #[test]
    fn sampling_and_layout() {
        assert_eq!(Sampling::from_subsampling(2, 1), Sampling::Sampling422);
        assert_eq!(Sampling::from_subsampling(4, 1), Sampling::Unknown);
        assert_eq!(FrameLayout::from_u8(0), FrameLayout::FullFrame);
        assert_eq!(FrameLayout::from_u8(9), FrameLayout::Unknown);
    }
}

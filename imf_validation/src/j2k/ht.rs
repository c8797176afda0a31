//! High-throughput JPEG 2000 codestream constraints, for App #2E HT.
//!
//! Every check runs, even after one fails, so the log lists every problem.

use crate::{
    error_log::{ErrorCode, ErrorLevel, ErrorLog},
    j2k::{Capabilities, J2kHeaderParameters},
};

/// Which edition of the HT constraints to apply.
///
/// The editions only differ in how a Parameter B above the absolute cap is
/// reported.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum HtEdition {
    /// Parameter B above the cap is FATAL.
    #[default]
    Edition2021,

    /// Parameter B above the cap is NON_FATAL.
    Edition2023,
}

impl HtEdition {
    fn parameter_b_cap_level(&self) -> ErrorLevel {
        match self {
            HtEdition::Edition2021 => ErrorLevel::Fatal,
            HtEdition::Edition2023 => ErrorLevel::NonFatal,
        }
    }
}

/// CPRL progression.
const PROGRESSION_CPRL: u8 = 0x04;

/// Only the HT code-block style bit.
const HT_CODE_BLOCK_STYLE: u8 = 0x40;

/// `Rsiz` bit saying the CAP marker is present.
const RSIZ_CAP_PRESENT: u16 = 0x4000;

/// `Ccap15` bit saying the reversible path is used.
const CCAP15_HTREV: u16 = 0x0020;

/// `Ccap15` bits that must be clear.
const CCAP15_RESERVED: u16 = 0xf000;

/// The largest Parameter B these constraints allow, for irreversible and
/// reversible transforms.
const PARAMETER_B_CAP_IRREVERSIBLE: u32 = 21;
const PARAMETER_B_CAP_REVERSIBLE: u32 = 31;

/// The most decomposition levels an image of this size may use.
pub fn max_decomposition_levels(width: u32, height: u32) -> u8 {
    match width.max(height) {
        0..=2048 => 5,
        2049..=4096 => 6,
        _ => 7,
    }
}

/// Decodes Parameter B from the `MAGB` bits of `Ccap15`.
pub fn declared_parameter_b(ccap15: u16) -> u32 {
    let p = (ccap15 & 0x1f) as u32;
    match p {
        0..20 => p + 8,
        20..31 => 4 * (p - 19) + 27,
        _ => 74,
    }
}

/// The Parameter B a conforming encoder needs for these coding choices.
pub fn expected_parameter_b(bit_depth: u8, reversible: bool, mct: bool, levels: u8) -> u32 {
    let bit_depth = bit_depth as u32;
    if reversible {
        bit_depth + mct as u32 + 2 + levels as u32 / 2
    } else {
        bit_depth + 2
    }
}

/// Checks HT codestream parameters.
///
/// Returns whether the parameters are valid: nothing worse than a WARNING
/// was logged.
pub fn validate_ht_constraints(
    params: &J2kHeaderParameters,
    edition: HtEdition,
    log: &mut ErrorLog,
) -> bool {
    let batch_start = log.len();

    if params.rsiz & RSIZ_CAP_PRESENT == 0 {
        fail(log, format!("Rsiz `0x{:04x}` doesn't flag a CAP marker.", params.rsiz));
    }

    // geometry
    if params.xosiz != 0 || params.yosiz != 0 || params.xtosiz != 0 || params.ytosiz != 0 {
        fail(log, "image and tile offsets must all be zero.".into());
    }

    if params.xtsiz < params.xsiz || params.ytsiz < params.ysiz {
        fail(
            log,
            format!(
                "tile `{}x{}` is smaller than the image `{}x{}`.",
                params.xtsiz, params.ytsiz, params.xsiz, params.ysiz
            ),
        );
    }

    // components
    let components = params.csiz.len();
    if !(1..=4).contains(&components) {
        fail(log, format!("`{components}` components, but 1 to 4 are allowed."));
    }

    for (i, c) in params.csiz.iter().enumerate() {
        let subsampling_ok = match i {
            1 | 2 => {
                (c.xrsiz == 1 || c.xrsiz == 2)
                    && c.yrsiz == 1
                    && params.csiz.get(1).map(|c1| c1.xrsiz) == Some(c.xrsiz)
            }
            _ => c.xrsiz == 1 && c.yrsiz == 1,
        };
        if !subsampling_ok {
            fail(
                log,
                format!(
                    "component `{i}` has subsampling `{}x{}`, which isn't allowed there.",
                    c.xrsiz, c.yrsiz
                ),
            );
        }
    }

    let bit_depth = params.uniform_bit_depth();
    if bit_depth.is_none() && !params.csiz.is_empty() {
        fail(log, "components don't share one bit depth.".into());
    }

    // capabilities
    let ccap15 = match &params.cap {
        Some(cap) => {
            if cap.pcap != Capabilities::PART15_ONLY {
                fail(
                    log,
                    format!("Pcap `0x{:08x}` must only flag Part 15.", cap.pcap),
                );
            }
            if cap.ccap.len() != 1 {
                fail(
                    log,
                    format!("expected one Ccap value, but found `{}`.", cap.ccap.len()),
                );
            }
            let ccap15 = cap.ccap15();
            if ccap15.is_some_and(|c| c & CCAP15_RESERVED != 0) {
                fail(log, "Ccap15 bits 12 to 15 must be zero.".into());
            }
            ccap15
        }
        None => {
            fail(log, "no CAP marker.".into());
            None
        }
    };

    // coding style
    let Some(cod) = params.cod.as_ref() else {
        fail(log, "no coding style default.".into());
        return batch_ok(log, batch_start);
    };

    if cod.code_block_style != HT_CODE_BLOCK_STYLE {
        fail(
            log,
            format!(
                "code-block style is `0x{:02x}`, but must be `0x{HT_CODE_BLOCK_STYLE:02x}`.",
                cod.code_block_style
            ),
        );
    }

    if cod.progression_order != PROGRESSION_CPRL {
        fail(
            log,
            format!("progression order `{}` isn't CPRL.", cod.progression_order),
        );
    }

    let max_levels = max_decomposition_levels(params.xsiz, params.ysiz);
    if cod.decomposition_levels == 0 || cod.decomposition_levels > max_levels {
        fail(
            log,
            format!(
                "`{}` decomposition levels, but this image allows 1 to `{max_levels}`.",
                cod.decomposition_levels
            ),
        );
    }

    if cod.number_of_layers != 1 {
        fail(
            log,
            format!("`{}` quality layers, but exactly one is allowed.", cod.number_of_layers),
        );
    }

    let (cb_w, cb_h) = (cod.xcb as u32 + 2, cod.ycb as u32 + 2);
    if !(5..=7).contains(&cb_w) || !(5..=6).contains(&cb_h) || cb_w + cb_h > 12 {
        fail(
            log,
            format!(
                "code-block size `{}x{}` is out of bounds.",
                cod.code_block_width(),
                cod.code_block_height()
            ),
        );
    }

    if cod.transformation > 1 {
        fail(log, format!("unknown wavelet transformation `{}`.", cod.transformation));
    }
    if let Some(ccap15) = ccap15 {
        let htrev = ccap15 & CCAP15_HTREV != 0;
        if htrev != cod.is_reversible() {
            fail(
                log,
                format!(
                    "HTREV is `{htrev}`, but the transformation is `{}`.",
                    if cod.is_reversible() { "reversible" } else { "irreversible" }
                ),
            );
        }
    }

    let precincts_ok = cod.scod & 0x01 != 0
        && cod.precinct_sizes.len() == cod.decomposition_levels as usize + 1
        && cod.precinct_sizes.first() == Some(&0x77)
        && cod.precinct_sizes.iter().skip(1).all(|p| *p == 0x88);
    if !precincts_ok {
        fail(
            log,
            format!(
                "precinct sizes `{:02x?}` must be `77` then `88` for every other level.",
                cod.precinct_sizes
            ),
        );
    }

    // parameter B
    if let (Some(ccap15), Some(bit_depth)) = (ccap15, bit_depth) {
        let declared = declared_parameter_b(ccap15);
        let expected = expected_parameter_b(
            bit_depth,
            cod.is_reversible(),
            cod.multiple_component_transform != 0,
            cod.decomposition_levels,
        );
        let cap = if cod.is_reversible() {
            PARAMETER_B_CAP_REVERSIBLE
        } else {
            PARAMETER_B_CAP_IRREVERSIBLE
        };

        if declared > cap {
            log.add_error(
                ErrorCode::ImfEssenceComponentError,
                edition.parameter_b_cap_level(),
                format!("APP2.HT: Parameter B `{declared}` is above the cap of `{cap}`."),
            );
        } else if declared > expected {
            log.add_error(
                ErrorCode::ImfEssenceComponentError,
                ErrorLevel::Warning,
                format!(
                    "APP2.HT: Parameter B `{declared}` is above the expected `{expected}` for this bit depth and transform."
                ),
            );
        }
    }

    batch_ok(log, batch_start)
}

fn fail(log: &mut ErrorLog, description: String) {
    log.add_error(
        ErrorCode::ImfEssenceComponentError,
        ErrorLevel::Fatal,
        format!("APP2.HT: {description}"),
    );
}

/// Nothing worse than a WARNING since `batch_start`.
fn batch_ok(log: &ErrorLog, batch_start: usize) -> bool {
    let range = batch_start..log.len();
    !log.has_fatal_errors_in(range.clone())
        && log
            .errors_by_level(ErrorLevel::NonFatal, Some(range))
            .is_empty()
}

#[cfg(test)]
mod tests {
    use super::{
        HtEdition, declared_parameter_b, expected_parameter_b, max_decomposition_levels,
        validate_ht_constraints,
    };
    use crate::{
        error_log::{ErrorLevel, ErrorLog},
        j2k::{J2kHeaderParameters, tests::HT_DESCRIPTOR_XML},
        util::logger,
    };

    fn params() -> J2kHeaderParameters {
        J2kHeaderParameters::from_xml_str(HT_DESCRIPTOR_XML).unwrap()
    }

    #[test]
    fn valid_ht_header() {
        logger();
        let mut log = ErrorLog::new();
        assert!(validate_ht_constraints(&params(), HtEdition::default(), &mut log));
        assert!(log.is_empty(), "{log}");
    }

    #[test]
    fn every_failure_is_reported() {
        logger();
        let mut p = params();
        p.xosiz = 4;
        p.csiz[1].xrsiz = 2;
        if let Some(cod) = p.cod.as_mut() {
            cod.number_of_layers = 2;
        }

        let mut log = ErrorLog::new();
        assert!(!validate_ht_constraints(&p, HtEdition::default(), &mut log));
        // offsets, component 1 differing from 2, and layers
        assert_eq!(log.errors_by_level(ErrorLevel::Fatal, None).len(), 3);
    }

    #[test]
    fn htrev_must_match_transform() {
        logger();
        let mut p = params();
        if let Some(cod) = p.cod.as_mut() {
            cod.transformation = 1;
        }

        let mut log = ErrorLog::new();
        assert!(!validate_ht_constraints(&p, HtEdition::default(), &mut log));
        assert!(log.errors()[0].description().contains("HTREV"));
    }

    #[test]
    fn parameter_b_tiers() {
        logger();

        // 10-bit irreversible expects 12; MAGB 5 is B = 13
        let mut p = params();
        if let Some(cap) = p.cap.as_mut() {
            cap.ccap = vec![5];
        }
        let mut log = ErrorLog::new();
        assert!(validate_ht_constraints(&p, HtEdition::Edition2021, &mut log));
        assert_eq!(log.errors_by_level(ErrorLevel::Warning, None).len(), 1);

        // MAGB 20 is B = 31, above the irreversible cap
        if let Some(cap) = p.cap.as_mut() {
            cap.ccap = vec![20];
        }
        let mut log = ErrorLog::new();
        assert!(!validate_ht_constraints(&p, HtEdition::Edition2021, &mut log));
        assert_eq!(log.errors_by_level(ErrorLevel::Fatal, None).len(), 1);

        let mut log = ErrorLog::new();
        assert!(!validate_ht_constraints(&p, HtEdition::Edition2023, &mut log));
        assert_eq!(log.errors_by_level(ErrorLevel::NonFatal, None).len(), 1);
        assert!(!log.has_fatal_errors());
    }

    #[test]
    fn helpers() {
        assert_eq!(declared_parameter_b(0), 8);
        assert_eq!(declared_parameter_b(19), 27);
        assert_eq!(declared_parameter_b(20), 31);
        assert_eq!(declared_parameter_b(31), 74);

        assert_eq!(expected_parameter_b(10, false, true, 5), 12);
        assert_eq!(expected_parameter_b(16, true, true, 5), 21);

        assert_eq!(max_decomposition_levels(1920, 1080), 5);
        assert_eq!(max_decomposition_levels(3840, 2160), 6);
        assert_eq!(max_decomposition_levels(7680, 4320), 7);
    }
}

use imf_validation::{
    error_log::{ErrorLevel, ErrorLog},
    j2k::{
        J2kHeaderParameters,
        ht::{HtEdition, validate_ht_constraints},
        profile::J2kProfile,
    },
};
use imf_validation_types::{labels, ul::Ul};

fn logger() {
    _ = env_logger::builder()
        .filter_level(log::LevelFilter::max())
        .format_file(true)
        .format_line_number(true)
        .try_init();
}

/// A UHD 10-bit HTJ2K picture, as a JPEG 2000 sub-descriptor in a
/// regxml dump.
const UHD_HT_XML: &str = r#"
<r0:JPEG2000SubDescriptor xmlns:r0="http://www.smpte-ra.org/reg/395/2014/13/1/aaf">
    <r0:Rsiz>16384</r0:Rsiz>
    <r0:Xsiz>3840</r0:Xsiz>
    <r0:Ysiz>2160</r0:Ysiz>
    <r0:XOsiz>0</r0:XOsiz>
    <r0:YOsiz>0</r0:YOsiz>
    <r0:XTsiz>3840</r0:XTsiz>
    <r0:YTsiz>2160</r0:YTsiz>
    <r0:XTOsiz>0</r0:XTOsiz>
    <r0:YTOsiz>0</r0:YTOsiz>
    <r0:Csiz>3</r0:Csiz>
    <r0:PictureComponentSizing>
        <r0:J2KComponentSizing><r0:Ssiz>9</r0:Ssiz><r0:XRSiz>1</r0:XRSiz><r0:YRSiz>1</r0:YRSiz></r0:J2KComponentSizing>
        <r0:J2KComponentSizing><r0:Ssiz>9</r0:Ssiz><r0:XRSiz>1</r0:XRSiz><r0:YRSiz>1</r0:YRSiz></r0:J2KComponentSizing>
        <r0:J2KComponentSizing><r0:Ssiz>9</r0:Ssiz><r0:XRSiz>1</r0:XRSiz><r0:YRSiz>1</r0:YRSiz></r0:J2KComponentSizing>
    </r0:PictureComponentSizing>
    <r0:CodingStyleDefault>01040001010503034000778888888888</r0:CodingStyleDefault>
    <r0:QuantizationDefault>2090</r0:QuantizationDefault>
    <r0:J2KExtendedCapabilities>
        <r0:Pcap>131072</r0:Pcap>
        <r0:Ccapi><r0:UInt16>3</r0:UInt16></r0:Ccapi>
    </r0:J2KExtendedCapabilities>
</r0:JPEG2000SubDescriptor>"#;

#[test]
fn ht_descriptor_passes() {
    logger();
    let params = J2kHeaderParameters::from_xml_str(UHD_HT_XML).unwrap();
    assert_eq!(params.uniform_bit_depth(), Some(10));

    for edition in [HtEdition::Edition2021, HtEdition::Edition2023] {
        let mut log = ErrorLog::new();
        assert!(validate_ht_constraints(&params, edition, &mut log));
        assert!(log.is_empty(), "{log}");
    }
}

/// The wavelet transform must agree with the HTREV capability bit.
#[test]
fn reversible_transform_needs_htrev() {
    logger();
    let xml = UHD_HT_XML.replace(
        "01040001010503034000778888888888",
        "01040001010503034001778888888888",
    );
    let params = J2kHeaderParameters::from_xml_str(&xml).unwrap();
    assert!(params.cod.as_ref().unwrap().is_reversible());

    let mut log = ErrorLog::new();
    assert!(!validate_ht_constraints(&params, HtEdition::default(), &mut log));

    let fatal = log.errors_by_level(ErrorLevel::Fatal, None);
    assert_eq!(fatal.len(), 1, "{log}");
    assert!(fatal[0].description().contains("HTREV"));
}

/// Every broken constraint is reported, not just the first.
#[test]
fn broken_descriptor_reports_everything() {
    logger();
    let xml = UHD_HT_XML
        .replace("<r0:Pcap>131072</r0:Pcap>", "<r0:Pcap>0</r0:Pcap>")
        .replace(
            "01040001010503034000778888888888",
            "01000002010503034000778888888888",
        );
    let params = J2kHeaderParameters::from_xml_str(&xml).unwrap();

    let mut log = ErrorLog::new();
    assert!(!validate_ht_constraints(&params, HtEdition::default(), &mut log));

    let fatal = log.errors_by_level(ErrorLevel::Fatal, None);
    assert_eq!(fatal.len(), 3, "{log}");
    assert!(fatal.iter().any(|e| e.description().contains("Pcap")));
    assert!(fatal.iter().any(|e| e.description().contains("CPRL")));
    assert!(fatal.iter().any(|e| e.description().contains("quality layers")));
}

#[test]
fn coding_labels_name_their_profiles() {
    logger();
    let coding = |family: u8, level: u8| {
        let mut ul = labels::J2K_PICTURE_CODING_BASE;
        ul.0[14] = family;
        ul.0[15] = level;
        ul
    };

    assert_eq!(J2kProfile::classify(&coding(0x03, 0x01)), J2kProfile::Imf2k);
    assert_eq!(J2kProfile::classify(&coding(0x05, 0x0b)), J2kProfile::Imf4k);
    assert_eq!(J2kProfile::classify(&coding(0x07, 0x02)), J2kProfile::Imf8k);
    assert_eq!(J2kProfile::classify(&coding(0x08, 0x01)), J2kProfile::Ht);
    assert_eq!(J2kProfile::classify(&coding(0x14, 0x00)), J2kProfile::Broadcast(4));
    assert_eq!(J2kProfile::classify(&coding(0x08, 0x02)), J2kProfile::Unknown);

    let not_j2k: Ul = "urn:smpte:ul:060e2b34.04010101.04010101.01020000"
        .parse()
        .unwrap();
    assert_eq!(J2kProfile::classify(&not_j2k), J2kProfile::Unknown);
}

#[test]
fn imf_profiles_cover_their_own_resolutions() {
    logger();
    assert!(J2kProfile::Imf2k.resolution_allowed(1920, 1080));
    assert!(!J2kProfile::Imf2k.resolution_allowed(3840, 2160));

    assert!(J2kProfile::Imf4k.resolution_allowed(3840, 2160));
    assert!(!J2kProfile::Imf4k.resolution_allowed(1920, 1080));

    assert!(J2kProfile::Imf8k.resolution_allowed(7680, 4320));
    assert!(J2kProfile::Ht.resolution_allowed(7680, 4320));
}

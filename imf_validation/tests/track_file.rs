use std::path::PathBuf;

use imf_validation::{
    error::{KlvError, MxfError},
    error_log::ErrorLog,
    klv::read_length,
    provider::{FileByteRangeProvider, ResourceByteRangeProvider},
    track_file::{TrackFileError, validate_track_file},
};

fn logger() {
    _ = env_logger::builder()
        .filter_level(log::LevelFilter::max())
        .format_file(true)
        .format_line_number(true)
        .try_init();
}

/// Writes `bytes` to a file only this test uses.
fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "imf_validation_{}_{name}.mxf",
        std::process::id()
    ));
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn file_provider_reads_ranges() {
    logger();
    let bytes = (0_u8..=255).collect::<Vec<_>>();
    let path = temp_file("ranges", &bytes);

    let provider = FileByteRangeProvider::open(&path).unwrap();
    assert_eq!(provider.size(), 256);
    assert_eq!(provider.read_range(10, 13).unwrap(), vec![10, 11, 12, 13]);
    assert_eq!(provider.read_range(255, 255).unwrap(), vec![255]);
    assert!(provider.read_range(250, 256).is_err());

    std::fs::remove_file(path).unwrap();
}

/// A file without a random index pack can't be located, so it's corrupt
/// rather than non-compliant.
#[test]
fn file_without_rip_is_corrupt() {
    logger();
    let path = temp_file("no_rip", &[0_u8; 64]);
    let provider = FileByteRangeProvider::open(&path).unwrap();

    let mut log = ErrorLog::new();
    let err = validate_track_file(&provider, &mut log).unwrap_err();
    assert!(
        matches!(err, TrackFileError::Corrupt(MxfError::RandomIndexPack(_))),
        "{err}"
    );

    std::fs::remove_file(path).unwrap();
}

#[test]
fn tiny_buffers_are_corrupt() {
    logger();
    let mut log = ErrorLog::new();
    for bytes in [vec![], vec![0_u8; 3]] {
        assert!(matches!(
            validate_track_file(&bytes, &mut log),
            Err(TrackFileError::Corrupt(_))
        ));
    }
}

#[test]
fn ber_lengths() {
    logger();
    let cases: [(&[u8], u64, u8); 4] = [
        (&[0x7f], 127, 1),
        (&[0x81, 0x80], 128, 2),
        (&[0x83, 0x01, 0x00, 0x00], 65_536, 4),
        (&[0x88, 0, 0, 0, 0, 0, 0, 0x01, 0x00], 256, 9),
    ];
    for (bytes, length, size) in cases {
        let mut input = bytes;
        assert_eq!(read_length(&mut input), Ok((length, size)));
        assert!(input.is_empty());
    }

    assert_eq!(read_length(&mut [0x80_u8].as_slice()), Err(KlvError::ReservedLengthByte(0x80)));
    assert_eq!(read_length(&mut [0x89_u8].as_slice()), Err(KlvError::LengthFieldTooLong(9)));
    assert_eq!(read_length(&mut [0x82_u8, 0x01].as_slice()), Err(KlvError::NotEnoughData));
}

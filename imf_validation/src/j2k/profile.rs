//! JPEG 2000 profiles, from the picture essence coding label.

use imf_validation_types::{labels, ul::Ul};

/// The profile a picture coding label names.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum J2kProfile {
    /// Broadcast contribution, with its level.
    Broadcast(u8),
    Imf2k,
    Imf4k,
    Imf8k,

    /// High-throughput JPEG 2000, as used by App #2E HT.
    Ht,
    Unknown,
}

impl J2kProfile {
    /// Classifies a picture essence coding label.
    ///
    /// Bytes 0-13 must be a JPEG 2000 coding label (any version). Byte 14
    /// then names the profile family, and byte 15 the level or sub-profile.
    pub fn classify(coding: &Ul) -> J2kProfile {
        if !coding.equals_with_mask(&labels::J2K_PICTURE_CODING_BASE, labels::J2K_PICTURE_CODING_MASK)
        {
            return J2kProfile::Unknown;
        }

        let (family, level) = (coding.0[14], coding.0[15]);
        match family {
            0x11..=0x17 => J2kProfile::Broadcast(family - 0x10),
            0x02 | 0x03 if (0x01..=0x0b).contains(&level) => J2kProfile::Imf2k,
            0x04 | 0x05 if (0x01..=0x0b).contains(&level) => J2kProfile::Imf4k,
            0x06 | 0x07 if (0x01..=0x0b).contains(&level) => J2kProfile::Imf8k,
            0x08 if level == 0x01 => J2kProfile::Ht,
            _ => J2kProfile::Unknown,
        }
    }

    /// The largest image this profile allows, as `(width, height)`.
    pub const fn max_resolution(&self) -> Option<(u32, u32)> {
        match self {
            J2kProfile::Imf2k => Some((2048, 1556)),
            J2kProfile::Imf4k => Some((4096, 3112)),
            J2kProfile::Imf8k => Some((8192, 6224)),
            J2kProfile::Broadcast(_) | J2kProfile::Ht | J2kProfile::Unknown => None,
        }
    }

    /// Whether an image fits this profile.
    ///
    /// Each IMF profile starts where the one below it ends, so a 2K image
    /// isn't a valid 4K profile image.
    pub fn resolution_allowed(&self, width: u32, height: u32) -> bool {
        let min_width = match self {
            J2kProfile::Imf4k => 2048,
            J2kProfile::Imf8k => 4096,
            _ => 0,
        };

        match self.max_resolution() {
            Some((max_w, max_h)) => {
                width > min_width && width <= max_w && height > 0 && height <= max_h
            }
            None => width > 0 && height > 0,
        }
    }

    pub fn is_imf(&self) -> bool {
        matches!(
            self,
            J2kProfile::Imf2k | J2kProfile::Imf4k | J2kProfile::Imf8k
        )
    }
}

#[cfg(test)]
mod tests {
    use super::J2kProfile;
    use imf_validation_types::{labels, ul::Ul};

    fn coding(family: u8, level: u8) -> Ul {
        let mut ul = labels::J2K_PICTURE_CODING_BASE;
        ul.0[14] = family;
        ul.0[15] = level;
        ul
    }

    #[test]
    fn classifies_families() {
        assert_eq!(J2kProfile::classify(&coding(0x11, 0x00)), J2kProfile::Broadcast(1));
        assert_eq!(J2kProfile::classify(&coding(0x17, 0x00)), J2kProfile::Broadcast(7));
        assert_eq!(J2kProfile::classify(&coding(0x03, 0x01)), J2kProfile::Imf2k);
        assert_eq!(J2kProfile::classify(&coding(0x05, 0x04)), J2kProfile::Imf4k);
        assert_eq!(J2kProfile::classify(&coding(0x06, 0x0b)), J2kProfile::Imf8k);
        assert_eq!(J2kProfile::classify(&coding(0x08, 0x01)), J2kProfile::Ht);

        assert_eq!(J2kProfile::classify(&coding(0x02, 0x00)), J2kProfile::Unknown);
        assert_eq!(J2kProfile::classify(&coding(0x09, 0x01)), J2kProfile::Unknown);
        assert_eq!(J2kProfile::classify(&labels::OP1A), J2kProfile::Unknown);
    }

    #[test]
    fn version_byte_is_ignored() {
        let mut ul = coding(0x04, 0x02);
        ul.0[7] = 0x0d;
        assert_eq!(J2kProfile::classify(&ul), J2kProfile::Imf4k);
    }

    #[test]
    fn resolution_bounds() {
        assert!(J2kProfile::Imf4k.resolution_allowed(4096, 3112));
        assert!(J2kProfile::Imf4k.resolution_allowed(3840, 2160));
        assert!(!J2kProfile::Imf4k.resolution_allowed(2048, 1080));
        assert!(!J2kProfile::Imf4k.resolution_allowed(4096, 3113));

        assert!(J2kProfile::Imf2k.resolution_allowed(1920, 1080));
        assert!(!J2kProfile::Imf2k.resolution_allowed(0, 1080));
        assert!(J2kProfile::Ht.resolution_allowed(7680, 4320));
    }
}

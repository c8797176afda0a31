//! Universal Labels and unique identifiers.
//!
//! Every key, label, and reference in an MXF file is one of these. ULs are
//! always 16 bytes. Instance UIDs are 16 bytes as well, while package IDs are
//! 32-byte UMIDs - so [`MxfUid`] carries either.

/// A 16-byte SMPTE Universal Label.
///
/// Labels are compared exactly through `PartialEq`, or with a byte mask via
/// [`Ul::equals_with_mask`].
#[repr(C)]
#[derive(Clone, Copy, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct Ul(pub [u8; 16]);

/// Every registered SMPTE label starts with these four bytes.
pub const SMPTE_PREFIX: [u8; 4] = [0x06, 0x0e, 0x2b, 0x34];

/// A mask which compares everything except the version byte (byte 7).
pub const IGNORE_VERSION_MASK: u16 = 0b1111_1110_1111_1111;

impl Ul {
    /// Creates a label from its bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Creates a label from a big-endian integer.
    ///
    /// Tables use this so labels read the way registries print them.
    ///
    /// ```
    /// use imf_validation_types::ul::Ul;
    ///
    /// let ul = Ul::from_u128(0x060e2b34_04010101_0d010201_01010900);
    /// assert_eq!(ul.as_bytes()[14], 0x09);
    /// ```
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Tries to create a label from a slice.
    ///
    /// Returns `None` when the slice isn't exactly 16 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 16]>::try_from(bytes).ok().map(Self)
    }

    /// Grabs the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Grabs one byte of the label, if that index exists.
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Compares two labels, only looking at the bytes selected by `mask`.
    ///
    /// The mask is read most-significant bit first: bit `0x8000` gates byte 0,
    /// bit `0x4000` gates byte 1, and so on down to bit `0x0001` gating byte
    /// 15. A cleared bit means "don't care" for that byte.
    ///
    /// ```
    /// use imf_validation_types::ul::Ul;
    ///
    /// let a = Ul::new([0x06, 0x0e, 0x2b, 0x34, 4, 1, 1, 1, 0x0d, 1, 2, 1, 1, 1, 0x09, 0]);
    /// let b = Ul::new([0x06, 0x0e, 0x2b, 0x34, 4, 1, 1, 5, 0x0d, 1, 2, 1, 1, 1, 0x01, 0]);
    ///
    /// assert!(a.equals_with_mask(&b, 0b1111_1110_1111_1101));
    /// assert!(!a.equals_with_mask(&b, 0xffff));
    /// ```
    pub const fn equals_with_mask(&self, other: &Ul, mask: u16) -> bool {
        let mut i = 0_usize;
        while i < 16 {
            let gated = mask & (0x8000_u16 >> i) != 0;
            if gated && self.0[i] != other.0[i] {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Compares two labels while ignoring the version byte.
    pub const fn equals_ignoring_version(&self, other: &Ul) -> bool {
        self.equals_with_mask(other, IGNORE_VERSION_MASK)
    }

    /// Checks if this is a SMPTE-registered label (starts with `06 0e 2b 34`).
    pub fn is_smpte(&self) -> bool {
        self.0[..4] == SMPTE_PREFIX
    }

    /// The category designator (byte 4).
    ///
    /// `0x01` is a dictionary, `0x02` a group (sets and packs), `0x03` a
    /// wrapper, and `0x04` a label.
    pub const fn category_designator(&self) -> u8 {
        self.0[4]
    }

    /// The registry designator (byte 5).
    ///
    /// For groups, this says how a set's local items are coded.
    pub const fn registry_designator(&self) -> u8 {
        self.0[5]
    }

    /// The version byte (byte 7).
    pub const fn version(&self) -> u8 {
        self.0[7]
    }

    /// Byte 13, which names the kind of set or pack for group labels.
    pub const fn set_or_pack_kind(&self) -> u8 {
        self.0[13]
    }

    pub const fn is_dictionary(&self) -> bool {
        self.category_designator() == 0x01
    }

    pub const fn is_group(&self) -> bool {
        self.category_designator() == 0x02
    }

    pub const fn is_wrapper(&self) -> bool {
        self.category_designator() == 0x03
    }

    pub const fn is_label(&self) -> bool {
        self.category_designator() == 0x04
    }

    /// Local sets with 2-byte local tags and 2-byte lengths use registry
    /// designator `0x53`.
    pub const fn is_local_set_with_two_byte_tags(&self) -> bool {
        self.is_group() && self.registry_designator() == 0x53
    }

    /// Returns a copy with the version byte zeroed.
    ///
    /// Handy as a hash key when lookups shouldn't care about versions.
    pub const fn without_version(&self) -> Ul {
        let mut bytes = self.0;
        bytes[7] = 0x00;
        Ul(bytes)
    }
}

impl core::fmt::Debug for Ul {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Ul({self})")
    }
}

/// Formats as a URN, like `urn:smpte:ul:060e2b34.04010101.0d010201.01010900`.
impl core::fmt::Display for Ul {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("urn:smpte:ul:")?;
        for (i, chunk) in self.0.chunks(4).enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            for b in chunk {
                write!(f, "{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// An error from parsing a UL out of its URN form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UlParseError {
    pub input: String,
}

impl core::fmt::Display for UlParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Not a valid SMPTE UL URN: `{}`", self.input)
    }
}

impl core::error::Error for UlParseError {}

impl core::str::FromStr for Ul {
    type Err = UlParseError;

    /// Accepts `urn:smpte:ul:` URNs (case-insensitive), with or without the
    /// dots between groups.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || UlParseError {
            input: s.to_string(),
        };

        let trimmed = s.trim();
        let hex = match trimmed.get(..13) {
            Some(prefix) if prefix.eq_ignore_ascii_case("urn:smpte:ul:") => &trimmed[13..],
            _ => return Err(err()),
        };

        let digits: Vec<u8> = hex.bytes().filter(|b| *b != b'.').collect();
        if digits.len() != 32 {
            return Err(err());
        }

        let mut bytes = [0_u8; 16];
        for (i, pair) in digits.chunks(2).enumerate() {
            let pair = core::str::from_utf8(pair).map_err(|_| err())?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| err())?;
        }

        Ok(Ul(bytes))
    }
}

/// An identifier for a set instance or a package.
///
/// Instance UIDs (and strong references to them) are 16 bytes. Package IDs are
/// 32-byte UMIDs. Identifiers of different lengths never compare equal.
#[derive(Clone, Copy, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum MxfUid {
    Uid([u8; 16]),
    Umid([u8; 32]),
}

impl MxfUid {
    /// Builds an identifier from a 16 or 32 byte slice.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        match bytes.len() {
            16 => <[u8; 16]>::try_from(bytes).ok().map(MxfUid::Uid),
            32 => <[u8; 32]>::try_from(bytes).ok().map(MxfUid::Umid),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            MxfUid::Uid(b) => b.as_slice(),
            MxfUid::Umid(b) => b.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Identifiers are never empty. Provided to keep clippy happy.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The material number of a UMID: its last 16 bytes.
    pub fn material_number(&self) -> Option<[u8; 16]> {
        match self {
            MxfUid::Umid(b) => <[u8; 16]>::try_from(&b[16..]).ok(),
            MxfUid::Uid(_) => None,
        }
    }

    /// Checks whether every byte is zero (a "null" reference).
    pub fn is_zero(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }
}

impl core::fmt::Debug for MxfUid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MxfUid::Uid(_) => write!(f, "Uid({self})"),
            MxfUid::Umid(_) => write!(f, "Umid({self})"),
        }
    }
}

impl core::fmt::Display for MxfUid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in self.as_bytes() {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

//! The primer pack.
//!
//! Local sets don't spell out item ULs. Each item uses a 2-byte local tag,
//! and the primer pack (at the start of the header metadata) says which UL
//! each tag stands for.

use rustc_hash::FxHashMap;
use winnow::{Parser as _, binary::be_u16, binary::be_u32, error::EmptyError, token::take};

use imf_validation_types::ul::Ul;

use crate::error::MxfError;

/// Each primer entry is a 2-byte tag and a 16-byte UL.
const ENTRY_SIZE: u32 = 18;

/// A local tag to item UL map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrimerPack {
    entries: FxHashMap<u16, Ul>,
}

impl PrimerPack {
    /// Parses a primer pack's value.
    pub fn parse(mut value: &[u8]) -> Result<PrimerPack, MxfError> {
        let input = &mut value;
        let malformed = |_: EmptyError| {
            log::error!("Primer pack ended early.");
            MxfError::MalformedPrimerPack
        };

        let count: u32 = be_u32.parse_next(input).map_err(malformed)?;
        let size: u32 = be_u32.parse_next(input).map_err(malformed)?;

        if size != ENTRY_SIZE || count as u64 * ENTRY_SIZE as u64 != input.len() as u64 {
            log::error!(
                "Primer pack claims `{count}` entries of `{size}` bytes, but has `{}` bytes.",
                input.len()
            );
            return Err(MxfError::MalformedPrimerPack);
        }

        let mut entries = FxHashMap::default();
        for _ in 0..count {
            let tag: u16 = be_u16.parse_next(input).map_err(malformed)?;
            let ul: &[u8] = take(16_usize).parse_next(input).map_err(malformed)?;
            let ul = Ul::from_slice(ul).ok_or(MxfError::MalformedPrimerPack)?;

            if let Some(old) = entries.insert(tag, ul) {
                log::warn!("Primer tag `0x{tag:04x}` maps to both `{old}` and `{ul}`. Using the latter.");
            }
        }

        log::debug!("Primer pack has `{}` entries.", entries.len());
        Ok(PrimerPack { entries })
    }

    /// Finds the item UL for a local tag.
    pub fn get(&self, tag: u16) -> Option<&Ul> {
        self.entries.get(&tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::PrimerPack;
    use crate::{error::MxfError, util::logger};
    use imf_validation_types::properties::PropertyId;

    #[test]
    fn maps_tags_to_uls() {
        logger();
        let mut value = vec![0, 0, 0, 2, 0, 0, 0, 18];
        value.extend_from_slice(&[0x3c, 0x0a]);
        value.extend_from_slice(PropertyId::InstanceUid.ul().as_bytes());
        value.extend_from_slice(&[0x80, 0x01]);
        value.extend_from_slice(PropertyId::McaTagSymbol.ul().as_bytes());

        let primer = PrimerPack::parse(&value).unwrap();
        assert_eq!(primer.len(), 2);
        assert_eq!(primer.get(0x3c0a), Some(&PropertyId::InstanceUid.ul()));
        assert_eq!(primer.get(0x8001), Some(&PropertyId::McaTagSymbol.ul()));
        assert_eq!(primer.get(0x1234), None);
    }

    #[test]
    fn inconsistent_batches_fail() {
        logger();
        let value = vec![0, 0, 0, 1, 0, 0, 0, 18, 0x3c];
        assert!(matches!(
            PrimerPack::parse(&value),
            Err(MxfError::MalformedPrimerPack)
        ));

        let wrong_size = vec![0, 0, 0, 0, 0, 0, 0, 20];
        assert!(PrimerPack::parse(&wrong_size).is_err());
    }
}

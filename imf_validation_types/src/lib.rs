//! Types shared by `imf_validation`.
//!
//! This crate holds the static tables an MXF reader needs: Universal Labels,
//! the set and property dictionaries, and the colour tables used to classify
//! picture descriptors. Nothing in here touches bytes from a file.

#![forbid(unsafe_code)]

pub mod colorimetry;
pub mod labels;
pub mod primitives;
pub mod properties;
pub mod sets;
pub mod ul;

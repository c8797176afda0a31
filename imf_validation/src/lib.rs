//! # `imf_validation`
//!
//! A library to parse MXF track files and check them against the
//! Interoperable Master Format (IMF) constraints.
//!
//! ## What it checks
//!
//! - the KLV structure, partition packs, and random index pack of a file
//! - its header metadata, decoded into typed sets with every reference
//!   resolved
//! - Operational Pattern 1A (SMPTE ST 378)
//! - the IMF core constraints (SMPTE ST 2067-2 and ST 2067-5)
//! - the JPEG 2000 and HTJ2K codestream parameters of picture essence
//! - the application profiles: App #2E, App #5 ACES, IAB, and MGA S-ADM
//!
//! Problems are collected in an [`error_log::ErrorLog`] rather than
//! returned one at a time. A check only fails once it has run to the end, so
//! the ledger always holds every problem a batch found.
//!
//! ## Usage
//!
//! ```no_run
//! use imf_validation::{
//!     error_log::ErrorLog, provider::FileByteRangeProvider, track_file::validate_track_file,
//! };
//!
//! let provider = FileByteRangeProvider::open("audio.mxf").unwrap();
//! let mut log = ErrorLog::new();
//! match validate_track_file(&provider, &mut log) {
//!     Ok(file) => println!("Valid `{:?}` track file.", file.essence_kind),
//!     Err(e) => println!("{e}\n{log}"),
//! }
//! ```
//!
//! ## License
//!
//! This project is dual-licensed under either the Apache License 2.0 or the
//! MIT License at your option.

#![forbid(unsafe_code)]

pub mod error;
pub mod error_log;
pub mod header;
pub mod imf_constraints;
pub mod j2k;
pub mod klv;
pub mod op1a;
pub mod partition;
pub mod populate;
pub mod profiles;
pub mod provider;
pub mod track_file;

pub(crate) mod util;

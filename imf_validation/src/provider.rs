//! Byte-range providers.
//!
//! Everything in this crate reads its input through
//! [`ResourceByteRangeProvider`]. The validator doesn't care where the bytes
//! live - a buffer, a local file, or something remote implemented elsewhere.

use std::{
    fs::File,
    io::{Read as _, Seek as _, SeekFrom},
    path::Path,
};

use parking_lot::Mutex;

use crate::error::MxfError;

/// Something that can hand out inclusive byte ranges of a resource.
///
/// Implementations must be safe to share between threads, so independent
/// track-file checks can run in parallel over one resource.
pub trait ResourceByteRangeProvider: Send + Sync {
    /// The resource's size in bytes.
    fn size(&self) -> u64;

    /// Reads bytes `start..=end_inclusive`.
    ///
    /// Callers must keep `start <= end_inclusive < size()`.
    fn read_range(&self, start: u64, end_inclusive: u64) -> std::io::Result<Vec<u8>>;
}

/// Reads `len` bytes starting at `start`, checking bounds first.
///
/// Zero-length reads return nothing without touching the provider.
pub fn read_len(
    provider: &(impl ResourceByteRangeProvider + ?Sized),
    start: u64,
    len: u64,
) -> Result<Vec<u8>, MxfError> {
    if len == 0 {
        return Ok(Vec::new());
    }

    let size = provider.size();
    let end = start
        .checked_add(len - 1)
        .filter(|end| *end < size)
        .ok_or_else(|| {
            log::error!("Tried reading `{len}` bytes at `{start}`, but the resource is `{size}` bytes.");
            MxfError::OutOfRange {
                start,
                end: start.saturating_add(len - 1),
                size,
            }
        })?;

    let bytes = provider.read_range(start, end)?;
    if bytes.len() as u64 != len {
        log::error!(
            "Provider returned `{}` bytes, but `{len}` were requested.",
            bytes.len()
        );
        return Err(MxfError::OutOfRange { start, end, size });
    }

    Ok(bytes)
}

fn check_range(start: u64, end_inclusive: u64, size: u64) -> std::io::Result<()> {
    if start > end_inclusive || end_inclusive >= size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("range `{start}..={end_inclusive}` is outside `{size}` bytes"),
        ));
    }
    Ok(())
}

impl ResourceByteRangeProvider for [u8] {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read_range(&self, start: u64, end_inclusive: u64) -> std::io::Result<Vec<u8>> {
        check_range(start, end_inclusive, self.size())?;
        Ok(self[start as usize..=end_inclusive as usize].to_vec())
    }
}

impl ResourceByteRangeProvider for Vec<u8> {
    fn size(&self) -> u64 {
        self.as_slice().size()
    }

    fn read_range(&self, start: u64, end_inclusive: u64) -> std::io::Result<Vec<u8>> {
        self.as_slice().read_range(start, end_inclusive)
    }
}

/// Reads ranges out of a local file.
///
/// Seeks are serialised on a lock, so one provider can be shared.
#[derive(Debug)]
pub struct FileByteRangeProvider {
    file: Mutex<File>,
    size: u64,
}

impl FileByteRangeProvider {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(file)
    }

    pub fn new(file: File) -> std::io::Result<Self> {
        let size = file.metadata()?.len();
        log::debug!("Opened file provider with `{size}` bytes.");
        Ok(Self {
            file: Mutex::new(file),
            size,
        })
    }
}

impl ResourceByteRangeProvider for FileByteRangeProvider {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_range(&self, start: u64, end_inclusive: u64) -> std::io::Result<Vec<u8>> {
        check_range(start, end_inclusive, self.size)?;

        let len = (end_inclusive - start + 1) as usize;
        let mut buf = vec![0_u8; len];

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut buf)?;

        Ok(buf)
    }
}

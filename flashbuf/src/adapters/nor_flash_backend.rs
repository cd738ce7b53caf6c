//! NOR flash backend for embedded-storage traits
//!
//! Appends the session's bytes into a fixed region of a NOR flash part,
//! erasing sectors just ahead of the write cursor. With a buffered writer
//! in front, each sector is erased once and programmed in large runs.
//!
//! # Example
//!
//! ```ignore
//! use esp_storage::FlashStorage as EspFlash;
//! use flashbuf::adapters::{NorFlashBackend, NorFlashRegion};
//! use flashbuf::domain::BufferedWriter;
//!
//! let flash = EspFlash::new();
//! let backend = NorFlashBackend::new(flash, NorFlashRegion::default_4mb())?;
//! let mut writer = BufferedWriter::new(backend, heap);
//! writer.open("spectra")?;
//! ```

extern crate alloc;
use alloc::vec::Vec;
use core::fmt;

use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};

use crate::domain::StorageBackend;

/// Sector size the region is laid out in (4KB).
pub const NOR_FLASH_SECTOR_SIZE: usize = 4096;

/// Value of erased NOR flash; used to pad the final partial word.
const ERASED: u8 = 0xFF;

/// Region of flash the backend writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NorFlashRegion {
    /// Start offset in flash (must be 4KB sector-aligned)
    pub start_offset: u32,
    /// Number of 4KB sectors in the region
    pub sector_count: u32,
}

impl NorFlashRegion {
    /// Create a new region
    ///
    /// # Panics
    /// Panics if `start_offset` is not 4KB aligned, or if the region does not
    /// fit in the 32-bit flash address space
    pub fn new(start_offset: u32, sector_count: u32) -> Self {
        assert!(
            start_offset % NOR_FLASH_SECTOR_SIZE as u32 == 0,
            "start_offset must be 4KB aligned"
        );
        assert!(
            sector_count
                .checked_mul(NOR_FLASH_SECTOR_SIZE as u32)
                .and_then(|len| len.checked_add(start_offset))
                .is_some(),
            "region must fit in 32-bit flash addresses"
        );
        Self {
            start_offset,
            sector_count,
        }
    }

    /// Last 256KB of a 4MB flash (offset 0x3C0000, 64 sectors).
    pub fn default_4mb() -> Self {
        Self::new(0x3C_0000, 64)
    }

    /// Last 1MB of a 16MB flash (offset 0xF00000, 256 sectors).
    pub fn default_16mb() -> Self {
        Self::new(0xF0_0000, 256)
    }

    /// Region size in bytes, saturating at `u32::MAX`.
    #[inline]
    pub fn len(&self) -> u32 {
        self.sector_count.saturating_mul(NOR_FLASH_SECTOR_SIZE as u32)
    }

    /// Check if the region has no sectors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sector_count == 0
    }
}

impl Default for NorFlashRegion {
    fn default() -> Self {
        Self::default_4mb()
    }
}

/// Error type for the NOR flash backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NorFlashBackendError {
    /// The flash driver reported an error.
    Flash(NorFlashErrorKind),
    /// The write does not fit in what is left of the region.
    OutOfSpace {
        /// Bytes the write needs, including word padding.
        requested: usize,
        /// Bytes left in the region.
        available: usize,
    },
    /// The region does not line up with the part's erase or write size.
    Misaligned,
}

impl fmt::Display for NorFlashBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flash(kind) => write!(f, "NOR flash error: {:?}", kind),
            Self::OutOfSpace {
                requested,
                available,
            } => write!(
                f,
                "Flash region full: {} bytes requested, {} available",
                requested, available
            ),
            Self::Misaligned => write!(f, "Flash region does not match erase/write size"),
        }
    }
}

impl core::error::Error for NorFlashBackendError {}

/// Write cursor into the region for one open stream.
#[derive(Debug)]
pub struct NorFlashStream {
    // Next programming offset, relative to the region start.
    cursor: u32,
    // Everything below this offset has been erased for this stream.
    erased_until: u32,
    // Bytes waiting for a full program word.
    tail: Vec<u8>,
    written: usize,
}

impl NorFlashStream {
    /// Bytes accepted by this stream so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Storage backend that writes into a region of NOR flash.
///
/// The region holds one stream at a time; opening starts again at the
/// region start. The path is only used for logging. Sectors are erased
/// lazily, right before the first byte lands in them. Writes that are not a
/// multiple of the part's program size keep their last partial word in RAM
/// until more bytes arrive; `close` pads it with `0xFF`.
pub struct NorFlashBackend<F> {
    flash: F,
    region: NorFlashRegion,
    stored: Option<usize>,
}

impl<F: NorFlash> NorFlashBackend<F> {
    /// Create a backend over `region` of `flash`.
    ///
    /// # Errors
    ///
    /// Returns [`NorFlashBackendError::Misaligned`] if the region start or
    /// size is not a multiple of the part's erase size, or the erase size is
    /// not a multiple of its write size.
    pub fn new(flash: F, region: NorFlashRegion) -> Result<Self, NorFlashBackendError> {
        let erase = F::ERASE_SIZE as u32;
        if erase == 0
            || F::WRITE_SIZE == 0
            || region.start_offset % erase != 0
            || region.len() % erase != 0
            || F::ERASE_SIZE % F::WRITE_SIZE != 0
        {
            return Err(NorFlashBackendError::Misaligned);
        }
        if (region.start_offset as usize).saturating_add(region.len() as usize) > flash.capacity() {
            return Err(NorFlashBackendError::OutOfSpace {
                requested: region.len() as usize,
                available: flash.capacity().saturating_sub(region.start_offset as usize),
            });
        }
        Ok(Self {
            flash,
            region,
            stored: None,
        })
    }

    /// Length of the last stream that was closed, if any.
    pub fn stored_len(&self) -> Option<usize> {
        self.stored
    }

    /// Get a reference to the flash.
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Program `bytes` at region offset `at`, erasing sectors up to the end
    /// of the run first. Returns the offset just past the run.
    ///
    /// Reprogramming the same bytes at the same offset is harmless on NOR,
    /// so a failed run can be retried from `at`.
    fn program(&mut self, erased_until: &mut u32, at: u32, bytes: &[u8]) -> Result<u32, NorFlashBackendError> {
        let end = at + bytes.len() as u32;
        if bytes.is_empty() {
            return Ok(end);
        }

        while *erased_until < end {
            let from = self.region.start_offset + *erased_until;
            let to = from + F::ERASE_SIZE as u32;
            self.flash.erase(from, to).map_err(flash_error)?;
            trace!("erased {:x}..{:x}", from, to);
            *erased_until += F::ERASE_SIZE as u32;
        }

        self.flash
            .write(self.region.start_offset + at, bytes)
            .map_err(flash_error)?;
        Ok(end)
    }
}

fn flash_error<E: NorFlashError>(e: E) -> NorFlashBackendError {
    NorFlashBackendError::Flash(e.kind())
}

#[inline]
fn round_up(n: usize, to: usize) -> usize {
    n.div_ceil(to) * to
}

impl<F: NorFlash> StorageBackend for NorFlashBackend<F> {
    type Handle = NorFlashStream;
    type Error = NorFlashBackendError;

    fn open(&mut self, path: &str) -> Result<NorFlashStream, NorFlashBackendError> {
        debug!(
            "{}: writing to flash region at {:x} ({} bytes)",
            path,
            self.region.start_offset,
            self.region.len()
        );
        Ok(NorFlashStream {
            cursor: 0,
            erased_until: 0,
            tail: Vec::with_capacity(F::WRITE_SIZE),
            written: 0,
        })
    }

    fn write_bytes(&mut self, stream: &mut NorFlashStream, data: &[u8]) -> Result<(), NorFlashBackendError> {
        let word = F::WRITE_SIZE;
        let requested = round_up(stream.tail.len() + data.len(), word);
        let available = (self.region.len() - stream.cursor) as usize;
        if requested > available {
            return Err(NorFlashBackendError::OutOfSpace {
                requested,
                available,
            });
        }

        if stream.tail.len() + data.len() < word {
            stream.tail.extend_from_slice(data);
            stream.written += data.len();
            return Ok(());
        }

        // The stream is only touched once every program has succeeded.
        let mut cursor = stream.cursor;
        let mut rest = data;
        if !stream.tail.is_empty() {
            let take = word - stream.tail.len();
            let mut first = Vec::with_capacity(word);
            first.extend_from_slice(&stream.tail);
            first.extend_from_slice(&rest[..take]);
            cursor = self.program(&mut stream.erased_until, cursor, &first)?;
            rest = &rest[take..];
        }

        let aligned = rest.len() - rest.len() % word;
        cursor = self.program(&mut stream.erased_until, cursor, &rest[..aligned])?;

        stream.cursor = cursor;
        stream.tail.clear();
        stream.tail.extend_from_slice(&rest[aligned..]);
        stream.written += data.len();
        Ok(())
    }

    fn close(&mut self, mut stream: NorFlashStream) -> Result<(), NorFlashBackendError> {
        if !stream.tail.is_empty() {
            let mut tail = core::mem::take(&mut stream.tail);
            tail.resize(F::WRITE_SIZE, ERASED);
            stream.cursor = self.program(&mut stream.erased_until, stream.cursor, &tail)?;
        }
        self.stored = Some(stream.written);
        debug!("flash stream closed at {} bytes", stream.written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_storage::nor_flash::{ErrorType, ReadNorFlash};

    /// Mock NOR flash: program can only clear bits, erase sets a sector to 0xFF.
    struct MockFlash {
        data: Vec<u8>,
        erases: usize,
        programs: Vec<(u32, usize)>,
        fail_in: Option<usize>,
    }

    impl MockFlash {
        fn new(sectors: usize) -> Self {
            Self {
                data: vec![0x00; sectors * NOR_FLASH_SECTOR_SIZE],
                erases: 0,
                programs: Vec::new(),
                fail_in: None,
            }
        }

        /// Let `ok` more writes through, then fail exactly one.
        fn fail_write_after(&mut self, ok: usize) {
            self.fail_in = Some(ok);
        }
    }

    #[derive(Debug)]
    struct MockFlashError(NorFlashErrorKind);

    impl NorFlashError for MockFlashError {
        fn kind(&self) -> NorFlashErrorKind {
            self.0
        }
    }

    impl ErrorType for MockFlash {
        type Error = MockFlashError;
    }

    impl ReadNorFlash for MockFlash {
        const READ_SIZE: usize = 1;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let offset = offset as usize;
            bytes.copy_from_slice(&self.data[offset..offset + bytes.len()]);
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.data.len()
        }
    }

    impl NorFlash for MockFlash {
        const WRITE_SIZE: usize = 4;
        const ERASE_SIZE: usize = NOR_FLASH_SECTOR_SIZE;

        fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            if from as usize % Self::ERASE_SIZE != 0 || to as usize % Self::ERASE_SIZE != 0 {
                return Err(MockFlashError(NorFlashErrorKind::NotAligned));
            }
            self.data[from as usize..to as usize].fill(0xFF);
            self.erases += 1;
            Ok(())
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            match self.fail_in {
                Some(0) => {
                    self.fail_in = None;
                    return Err(MockFlashError(NorFlashErrorKind::Other));
                }
                Some(n) => self.fail_in = Some(n - 1),
                None => {}
            }
            if offset as usize % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
                return Err(MockFlashError(NorFlashErrorKind::NotAligned));
            }
            let start = offset as usize;
            if start + bytes.len() > self.data.len() {
                return Err(MockFlashError(NorFlashErrorKind::OutOfBounds));
            }
            for (cell, byte) in self.data[start..start + bytes.len()].iter_mut().zip(bytes) {
                *cell &= *byte;
            }
            self.programs.push((offset, bytes.len()));
            Ok(())
        }
    }

    fn backend(sectors: u32) -> NorFlashBackend<MockFlash> {
        NorFlashBackend::new(MockFlash::new(sectors as usize), NorFlashRegion::new(0, sectors)).unwrap()
    }

    #[test]
    fn test_aligned_writes_land_in_order() {
        let mut backend = backend(4);
        let mut stream = backend.open("log").unwrap();
        let chunk = vec![0xA5u8; NOR_FLASH_SECTOR_SIZE];
        backend.write_bytes(&mut stream, &chunk).unwrap();
        backend.write_bytes(&mut stream, &chunk).unwrap();
        backend.close(stream).unwrap();

        let flash = backend.flash();
        assert_eq!(flash.erases, 2);
        assert!(flash.data[..2 * NOR_FLASH_SECTOR_SIZE].iter().all(|&b| b == 0xA5));
        assert_eq!(backend.stored_len(), Some(2 * NOR_FLASH_SECTOR_SIZE));
    }

    #[test]
    fn test_partial_words_are_carried() {
        let mut backend = backend(1);
        let mut stream = backend.open("log").unwrap();
        backend.write_bytes(&mut stream, b"abc").unwrap();
        backend.write_bytes(&mut stream, b"defgh").unwrap();
        backend.write_bytes(&mut stream, b"ij").unwrap();
        backend.close(stream).unwrap();

        let flash = backend.flash();
        assert_eq!(&flash.data[..12], b"abcdefghij\xFF\xFF");
        assert!(flash.programs.iter().all(|&(off, len)| off % 4 == 0 && len % 4 == 0));
        assert_eq!(backend.stored_len(), Some(10));
    }

    #[test]
    fn test_failed_tail_program_keeps_carried_bytes() {
        let mut backend = backend(1);
        let mut stream = backend.open("log").unwrap();
        backend.write_bytes(&mut stream, b"abc").unwrap();

        backend.flash.fail_write_after(0);
        let err = backend.write_bytes(&mut stream, b"defgh").unwrap_err();
        assert_eq!(err, NorFlashBackendError::Flash(NorFlashErrorKind::Other));
        assert_eq!(stream.written(), 3);

        backend.write_bytes(&mut stream, b"defgh").unwrap();
        assert_eq!(stream.written(), 8);
        backend.close(stream).unwrap();

        assert_eq!(&backend.flash().data[..8], b"abcdefgh");
        assert_eq!(backend.stored_len(), Some(8));
    }

    #[test]
    fn test_failed_aligned_program_is_not_duplicated() {
        let mut backend = backend(1);
        let mut stream = backend.open("log").unwrap();
        backend.write_bytes(&mut stream, b"abc").unwrap();

        // The completed first word lands, the aligned run after it fails.
        backend.flash.fail_write_after(1);
        assert!(backend.write_bytes(&mut stream, b"defghijkl").is_err());
        assert_eq!(stream.written(), 3);

        backend.write_bytes(&mut stream, b"defghijkl").unwrap();
        backend.write_bytes(&mut stream, b"m").unwrap();
        backend.close(stream).unwrap();

        assert_eq!(&backend.flash().data[..16], b"abcdefghijklm\xFF\xFF\xFF");
        assert_eq!(backend.stored_len(), Some(13));
    }

    #[test]
    fn test_sector_erased_once_per_stream() {
        let mut backend = backend(2);
        let mut stream = backend.open("log").unwrap();
        for _ in 0..8 {
            backend.write_bytes(&mut stream, &[1u8; 512]).unwrap();
        }
        backend.close(stream).unwrap();
        assert_eq!(backend.flash().erases, 1);
    }

    #[test]
    fn test_reopen_starts_at_region_start() {
        let mut backend = backend(1);
        let mut stream = backend.open("first").unwrap();
        backend.write_bytes(&mut stream, b"11111111").unwrap();
        backend.close(stream).unwrap();

        let mut stream = backend.open("second").unwrap();
        backend.write_bytes(&mut stream, b"2222").unwrap();
        backend.close(stream).unwrap();

        assert_eq!(&backend.flash().data[..4], b"2222");
        assert_eq!(backend.stored_len(), Some(4));
    }

    #[test]
    fn test_region_full() {
        let mut backend = backend(1);
        let mut stream = backend.open("log").unwrap();
        backend.write_bytes(&mut stream, &[0u8; 4000]).unwrap();
        let err = backend.write_bytes(&mut stream, &[0u8; 200]).unwrap_err();
        assert_eq!(
            err,
            NorFlashBackendError::OutOfSpace {
                requested: 200,
                available: 96,
            }
        );
    }

    #[test]
    fn test_region_must_fit_flash() {
        let result = NorFlashBackend::new(MockFlash::new(2), NorFlashRegion::new(0, 4));
        assert!(matches!(result, Err(NorFlashBackendError::OutOfSpace { .. })));
    }

    #[test]
    fn test_region_presets() {
        let region = NorFlashRegion::default_4mb();
        assert_eq!(region.start_offset, 0x3C_0000);
        assert_eq!(region.len(), 256 * 1024);
        assert_eq!(NorFlashRegion::default_16mb().sector_count, 256);
    }

    #[test]
    #[should_panic(expected = "32-bit flash addresses")]
    fn test_region_past_address_space() {
        let _ = NorFlashRegion::new(0, 1 << 20);
    }

    #[test]
    #[should_panic(expected = "4KB aligned")]
    fn test_region_unaligned() {
        let _ = NorFlashRegion::new(0x100, 64);
    }
}

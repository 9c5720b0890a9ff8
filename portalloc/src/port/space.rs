//! Bit-array occupancy tracking for one protocol's port band.

use crate::endpoint::Protocol;
use crate::error::{Error, Result};

use super::{Port, PortRange};

const WORD_BITS: usize = u64::BITS as usize;

/// Tracks which numbers of a single `[min, max]` band are held.
///
/// Storage is one bit per port in the band, so every test, reserve and
/// release is O(1). `reserve_next` scans whole 64-bit words and is bounded by
/// the band size.
///
/// # Examples
///
/// ```
/// use portalloc::{PortRange, PortSpace, Protocol};
///
/// let mut space = PortSpace::new(Protocol::Tcp, PortRange::from_values(30000, 30002).unwrap());
///
/// assert_eq!(space.reserve_next().unwrap().value(), 30000);
/// space.reserve(30001).unwrap();
/// assert!(space.reserve(30001).unwrap_err().is_conflict());
/// assert_eq!(space.reserve_next().unwrap().value(), 30002);
/// assert!(space.reserve_next().unwrap_err().is_exhausted());
///
/// space.release(30001);
/// assert_eq!(space.reserve_next().unwrap().value(), 30001);
/// ```
#[derive(Debug, Clone)]
pub struct PortSpace {
    protocol: Protocol,
    range: PortRange,
    words: Vec<u64>,
    reserved: usize,
}

impl PortSpace {
    /// Creates an empty space covering `range`.
    #[must_use]
    pub fn new(protocol: Protocol, range: PortRange) -> Self {
        Self {
            protocol,
            range,
            words: vec![0; range.len().div_ceil(WORD_BITS)],
            reserved: 0,
        }
    }

    /// The protocol this space tracks.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The band this space covers.
    #[must_use]
    pub const fn range(&self) -> PortRange {
        self.range
    }

    /// Returns `true` if `port` falls inside this space's band.
    #[must_use]
    pub const fn contains(&self, port: u16) -> bool {
        self.range.contains_value(port)
    }

    /// Returns `true` if `port` is inside the band and currently held.
    #[must_use]
    pub fn is_reserved(&self, port: u16) -> bool {
        self.slot(port)
            .is_some_and(|(word, mask)| self.words[word] & mask != 0)
    }

    /// Number of ports currently held.
    #[must_use]
    pub const fn reserved_count(&self) -> usize {
        self.reserved
    }

    /// Number of ports still free in the band.
    #[must_use]
    pub const fn available_count(&self) -> usize {
        self.range.len() - self.reserved
    }

    /// Marks `port` as held.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPort`] if `port` is 0.
    /// - [`Error::PortConflict`] if `port` is outside the band or already held.
    ///
    /// Nothing changes when an error is returned.
    pub fn reserve(&mut self, port: u16) -> Result<Port> {
        let port = Port::try_from(port)?;
        let Some((word, mask)) = self.slot(port.value()) else {
            return Err(self.conflict(port.value()));
        };
        if self.words[word] & mask != 0 {
            return Err(self.conflict(port.value()));
        }
        self.words[word] |= mask;
        self.reserved += 1;
        Ok(port)
    }

    /// Holds and returns the lowest free port in the band.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAvailablePorts`] when every port is held.
    pub fn reserve_next(&mut self) -> Result<Port> {
        let len = self.range.len();
        let free = self
            .words
            .iter()
            .enumerate()
            .find(|(_, bits)| **bits != u64::MAX)
            .map(|(index, bits)| index * WORD_BITS + bits.trailing_ones() as usize)
            .filter(|offset| *offset < len);

        let port = free
            .and_then(|offset| u16::try_from(offset).ok())
            .and_then(|offset| self.range.min().value().checked_add(offset))
            .ok_or(Error::NoAvailablePorts {
                protocol: self.protocol,
                range: self.range,
            })?;

        self.reserve(port)
    }

    /// Marks `port` as free.
    ///
    /// Releasing a port that is free, or outside the band, is a no-op.
    /// Returns `true` if the port was held before the call.
    pub fn release(&mut self, port: u16) -> bool {
        match self.slot(port) {
            Some((word, mask)) if self.words[word] & mask != 0 => {
                self.words[word] &= !mask;
                self.reserved -= 1;
                true
            }
            _ => false,
        }
    }

    fn slot(&self, port: u16) -> Option<(usize, u64)> {
        if !self.range.contains_value(port) {
            return None;
        }
        let offset = usize::from(port - self.range.min().value());
        Some((offset / WORD_BITS, 1 << (offset % WORD_BITS)))
    }

    fn conflict(&self, port: u16) -> Error {
        Error::PortConflict {
            protocol: self.protocol,
            port,
        }
    }
}

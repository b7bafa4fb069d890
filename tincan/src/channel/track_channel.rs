// -*- mode: rust; -*-
//
// This file is part of `tincan`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use crate::AbstractChannel;
use std::io::Result;

/// A channel wrapper counting the number of bytes read and written.
///
/// Clones share nothing: each clone keeps its own counters, starting from the
/// values of the channel it was cloned from.
pub struct TrackChannel<C> {
    channel: C,
    nbytes_read: usize,
    nbytes_written: usize,
}

impl<C: AbstractChannel> TrackChannel<C> {
    /// Wrap `channel`.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            nbytes_read: 0,
            nbytes_written: 0,
        }
    }

    /// Clear the number of bytes read/written.
    pub fn clear(&mut self) {
        self.nbytes_read = 0;
        self.nbytes_written = 0;
    }

    /// Number of bytes written to the channel.
    pub fn bytes_written(&self) -> usize {
        self.nbytes_written
    }

    /// Number of bytes read from the channel.
    pub fn bytes_read(&self) -> usize {
        self.nbytes_read
    }

    /// Return the number of kilobytes written to the channel.
    pub fn kilobytes_written(&self) -> f64 {
        self.nbytes_written as f64 / 1024.0
    }

    /// Return the number of kilobytes read from the channel.
    pub fn kilobytes_read(&self) -> f64 {
        self.nbytes_read as f64 / 1024.0
    }

    /// Return the total amount of communication on the channel as kilobytes.
    pub fn total_kilobytes(&self) -> f64 {
        self.kilobytes_written() + self.kilobytes_read()
    }

    /// Unwrap the inner channel.
    pub fn into_inner(self) -> C {
        self.channel
    }
}

impl<C: AbstractChannel> AbstractChannel for TrackChannel<C> {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.nbytes_written += bytes.len();
        self.channel.write_bytes(bytes)
    }

    #[inline]
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        self.nbytes_read += bytes.len();
        self.channel.read_bytes(bytes)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        self.channel.flush()
    }

    #[inline]
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            nbytes_written: self.nbytes_written,
            nbytes_read: self.nbytes_read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channel;
    use std::io::Cursor;

    #[test]
    fn test_counts_both_directions() {
        let inner = Channel::new(Cursor::new(vec![0u8; 12]), Vec::new());
        let mut channel = TrackChannel::new(inner);
        channel.write_u64(42).unwrap();
        channel.write_prefixed(b"abc").unwrap();
        let _ = channel.read_u64().unwrap();
        let _ = channel.read_u8().unwrap();
        assert_eq!(channel.bytes_written(), 8 + 8 + 3);
        assert_eq!(channel.bytes_read(), 9);
        channel.clear();
        assert_eq!(channel.total_kilobytes(), 0.0);
    }
}

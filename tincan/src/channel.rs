mod sync_channel;
mod track_channel;
#[cfg(all(unix, feature = "unix_channel"))]
mod unix_channel;

pub use sync_channel::{SyncChannel, TcpChannel};
pub use track_channel::TrackChannel;

#[cfg(all(unix, feature = "unix_channel"))]
pub use unix_channel::{track_unix_channel_pair, unix_channel_pair, TrackUnixChannel, UnixChannel};

use std::{
    cell::RefCell,
    io::{Error, ErrorKind, Read, Result, Write},
    rc::Rc,
};

/// A trait for managing I/O. `AbstractChannel`s are clonable, and provide basic
/// read/write capabilities for the integer and byte-string types that make up
/// protocol messages. All integers travel little-endian.
pub trait AbstractChannel {
    /// Read a slice of `u8`s from the channel.
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()>;
    /// Write a slice of `u8`s to the channel.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
    /// Flush the channel.
    fn flush(&mut self) -> Result<()>;
    /// Clone the channel.
    fn clone(&self) -> Self
    where
        Self: Sized;

    /// Read `nbytes` from the channel, and return it as a `Vec`.
    fn read_vec(&mut self, nbytes: usize) -> Result<Vec<u8>> {
        let mut data = vec![0; nbytes];
        self.read_bytes(&mut data)?;
        Ok(data)
    }

    /// Write a `u8` to the channel.
    #[inline(always)]
    fn write_u8(&mut self, s: u8) -> Result<()> {
        self.write_bytes(&[s])
    }

    /// Read a `u8` from the channel.
    #[inline(always)]
    fn read_u8(&mut self) -> Result<u8> {
        let mut data = [0];
        self.read_bytes(&mut data)?;
        Ok(data[0])
    }

    /// Write a `u64` to the channel.
    #[inline(always)]
    fn write_u64(&mut self, s: u64) -> Result<()> {
        self.write_bytes(&s.to_le_bytes())
    }

    /// Read a `u64` from the channel.
    #[inline(always)]
    fn read_u64(&mut self) -> Result<u64> {
        let mut data = [0u8; 8];
        self.read_bytes(&mut data)?;
        Ok(u64::from_le_bytes(data))
    }

    /// Write a `usize` to the channel.
    #[inline(always)]
    fn write_usize(&mut self, s: usize) -> Result<()> {
        self.write_u64(s as u64)
    }

    /// Read a `usize` from the channel.
    #[inline(always)]
    fn read_usize(&mut self) -> Result<usize> {
        let x = self.read_u64()?;
        usize::try_from(x).map_err(|e| Error::new(ErrorKind::InvalidData, e))
    }

    /// Write `bytes` preceded by their length.
    fn write_prefixed(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_usize(bytes.len())?;
        self.write_bytes(bytes)
    }

    /// Read a length-prefixed byte string of at most `max` bytes.
    ///
    /// The length is checked before anything is allocated, so a peer cannot
    /// make us reserve an arbitrary amount of memory.
    fn read_prefixed(&mut self, max: usize) -> Result<Vec<u8>> {
        let n = self.read_usize()?;
        if n > max {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("length prefix {} exceeds limit {}", n, max),
            ));
        }
        self.read_vec(n)
    }
}

/// A standard read/write channel that implements `AbstractChannel`.
pub struct Channel<R, W> {
    reader: Rc<RefCell<R>>,
    writer: Rc<RefCell<W>>,
}

impl<R: Read, W: Write> Channel<R, W> {
    /// Make a new `Channel` from a `reader` and a `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        let reader = Rc::new(RefCell::new(reader));
        let writer = Rc::new(RefCell::new(writer));
        Self { reader, writer }
    }

    /// Return a reader object wrapped in `Rc<RefCell>`.
    pub fn reader(self) -> Rc<RefCell<R>> {
        self.reader
    }

    /// Return a writer object wrapped in `Rc<RefCell>`.
    pub fn writer(self) -> Rc<RefCell<W>> {
        self.writer
    }
}

impl<R: Read, W: Write> AbstractChannel for Channel<R, W> {
    #[inline(always)]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.borrow_mut().write_all(bytes)
    }

    #[inline(always)]
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        self.reader.borrow_mut().read_exact(bytes)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<()> {
        self.writer.borrow_mut().flush()
    }

    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            writer: self.writer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec as pvec;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn loopback(bytes: Vec<u8>) -> Channel<Cursor<Vec<u8>>, Vec<u8>> {
        Channel::new(Cursor::new(bytes), Vec::new())
    }

    #[test]
    fn test_integers_are_little_endian() {
        let mut channel = Channel::new(Cursor::new(Vec::new()), Vec::new());
        channel.write_u8(7).unwrap();
        channel.write_u64(0x0102_0304_0506_0708).unwrap();
        channel.flush().unwrap();
        let written = channel.writer().borrow().clone();
        assert_eq!(written, vec![7, 8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_read_prefixed_rejects_oversized_length() {
        let mut bytes = 1_000_000u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 16]);
        let mut channel = loopback(bytes);
        let err = channel.read_prefixed(1024).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_prefixed_truncated_input() {
        let mut bytes = 8u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        let mut channel = loopback(bytes);
        let err = channel.read_prefixed(1024).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    proptest! {
        #[test]
        fn test_prefixed_round_trip(data in pvec(pvec(any::<u8>(), 0..64), 0..16)) {
            let mut sender = Channel::new(Cursor::new(Vec::new()), Vec::new());
            for item in data.iter() {
                sender.write_prefixed(item).unwrap();
            }
            let written = sender.writer().borrow().clone();
            let mut receiver = loopback(written);
            for item in data.iter() {
                prop_assert_eq!(&receiver.read_prefixed(64).unwrap(), item);
            }
        }
    }
}

use crate::AbstractChannel;
use std::{
    io::{BufReader, BufWriter, Error, ErrorKind, Read, Result, Write},
    net::TcpStream,
    sync::{Arc, Mutex, MutexGuard},
};

/// A channel that implements `AbstractChannel` as well as `Send` and `Sync`.
///
/// Use this when a party's protocol run is driven from a spawned thread, or
/// when the two directions of a socket are read and written through separate
/// handles.
pub struct SyncChannel<R, W> {
    reader: Arc<Mutex<R>>,
    writer: Arc<Mutex<W>>,
}

/// A buffered `SyncChannel` over a TCP connection.
pub type TcpChannel = SyncChannel<BufReader<TcpStream>, BufWriter<TcpStream>>;

impl<R: Read, W: Write> SyncChannel<R, W> {
    /// Make a new `SyncChannel` from a `reader` and a `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

impl TcpChannel {
    /// Buffer both halves of a connected `stream`.
    pub fn from_tcp(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self::new(reader, BufWriter::new(stream)))
    }
}

// A poisoned lock means another clone panicked mid-message; surface it as an
// I/O error rather than propagating the panic.
fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| Error::new(ErrorKind::Other, "channel lock poisoned"))
}

impl<R: Read, W: Write> AbstractChannel for SyncChannel<R, W> {
    #[inline(always)]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        lock(&self.writer)?.write_all(bytes)
    }

    #[inline(always)]
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        lock(&self.reader)?.read_exact(bytes)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<()> {
        lock(&self.writer)?.flush()
    }

    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            writer: self.writer.clone(),
        }
    }
}

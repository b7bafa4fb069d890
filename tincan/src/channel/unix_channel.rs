use crate::{SyncChannel, TrackChannel};
use std::{
    io::{BufReader, BufWriter},
    os::unix::net::UnixStream,
};

/// A SyncChannel which uses UnixStreams.
pub type UnixChannel = SyncChannel<BufReader<UnixStream>, BufWriter<UnixStream>>;

/// A TrackChannel which uses UnixStreams.
pub type TrackUnixChannel = TrackChannel<UnixChannel>;

fn wrap(stream: UnixStream) -> std::io::Result<UnixChannel> {
    let reader = BufReader::new(stream.try_clone()?);
    Ok(SyncChannel::new(reader, BufWriter::new(stream)))
}

/// Create a connected pair of `UnixChannel`s, for running both parties of a
/// protocol within one process.
pub fn unix_channel_pair() -> std::io::Result<(UnixChannel, UnixChannel)> {
    let (tx, rx) = UnixStream::pair()?;
    Ok((wrap(tx)?, wrap(rx)?))
}

/// Create a connected pair of `TrackUnixChannel`s.
pub fn track_unix_channel_pair() -> std::io::Result<(TrackUnixChannel, TrackUnixChannel)> {
    let (a, b) = unix_channel_pair()?;
    Ok((TrackChannel::new(a), TrackChannel::new(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AbstractChannel;

    #[test]
    fn test_pair_is_connected() {
        let (mut a, mut b) = track_unix_channel_pair().unwrap();
        let handle = std::thread::spawn(move || {
            let v = b.read_prefixed(16).unwrap();
            b.write_u64(v.len() as u64).unwrap();
            b.flush().unwrap();
            b.bytes_read()
        });
        a.write_prefixed(b"hello").unwrap();
        a.flush().unwrap();
        assert_eq!(a.read_u64().unwrap(), 5);
        assert_eq!(handle.join().unwrap(), 13);
        assert_eq!(a.bytes_written(), 13);
    }
}

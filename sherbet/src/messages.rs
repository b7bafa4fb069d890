//! The two protocol messages and their encoding on a channel.
//!
//! All integers are little-endian. Points are canonical compressed encodings
//! of the run's group, concatenated without separators.
//!
//! ```text
//! Request  := group:u8 count:u64 point[count]
//! Response := group:u8 kind:u8 count:u64 point[count] ServerSet
//! ServerSet := n:u64 point[n]                                         (kind 0)
//!            | nkeys:u64 nvalues:u64 rice:u8 keybits:u8 len:u64 blob[len] (kind 1)
//! ```

use crate::{
    blind::{encode_all, Encode},
    gcs::GolombCodedSet,
    group::GroupChoice,
    Error,
};
use tincan::AbstractChannel;

/// Upper bound on any single length-prefixed field we are willing to read.
pub const MAX_MESSAGE_BYTES: usize = 1 << 30;

const KIND_EXACT: u8 = 0;
const KIND_COMPRESSED: u8 = 1;

/// A list of fixed-width point encodings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPoints {
    width: usize,
    bytes: Vec<u8>,
}

impl EncodedPoints {
    /// Wrap concatenated encodings of `width` bytes each.
    pub fn new(width: usize, bytes: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || bytes.len() % width != 0 {
            return Err(Error::violation(format!(
                "{} bytes is not a whole number of {}-byte points",
                bytes.len(),
                width
            )));
        }
        Ok(Self { width, bytes })
    }

    pub(crate) fn from_points<T: Encode>(items: &[T]) -> Self {
        Self {
            width: T::LEN,
            bytes: encode_all(items),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.width
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Width of one encoding.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The concatenated encodings.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterate over the individual encodings.
    pub fn iter(&self) -> std::slice::ChunksExact<'_, u8> {
        self.bytes.chunks_exact(self.width)
    }

    fn write<C: AbstractChannel>(&self, channel: &mut C) -> Result<(), Error> {
        channel.write_usize(self.len())?;
        channel.write_bytes(&self.bytes)?;
        Ok(())
    }

    fn read<C: AbstractChannel>(channel: &mut C, width: usize) -> Result<Self, Error> {
        let count = channel.read_usize()?;
        let nbytes = count
            .checked_mul(width)
            .filter(|n| *n <= MAX_MESSAGE_BYTES)
            .ok_or_else(|| Error::violation(format!("{} points exceed the message limit", count)))?;
        Self::new(width, channel.read_vec(nbytes)?)
    }
}

fn read_group<C: AbstractChannel>(channel: &mut C) -> Result<GroupChoice, Error> {
    let id = channel.read_u8()?;
    GroupChoice::from_id(id).ok_or_else(|| Error::violation(format!("unknown group id {}", id)))
}

/// The client's message: its blinded set, shuffled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// The group the points live in.
    pub group: GroupChoice,
    /// `H(x)^a` for each client element, in random order.
    pub points: EncodedPoints,
}

impl Request {
    /// Write the request to `channel`. Does not flush.
    pub fn write<C: AbstractChannel>(&self, channel: &mut C) -> Result<(), Error> {
        channel.write_u8(self.group.id())?;
        self.points.write(channel)
    }

    /// Read a request from `channel`.
    pub fn read<C: AbstractChannel>(channel: &mut C) -> Result<Self, Error> {
        let group = read_group(channel)?;
        let points = EncodedPoints::read(channel, group.element_len())?;
        Ok(Self { group, points })
    }
}

/// The server's own set, in one of the two encodings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerSet {
    /// `H(y)^b` for each server element, in random order.
    Exact(EncodedPoints),
    /// Integer keys of `H(y)^b`, Golomb coded.
    Compressed(GolombCodedSet),
}

/// The server's message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// The group the points live in.
    pub group: GroupChoice,
    /// The request's points with the server's exponent applied, in request
    /// order.
    pub double_blinded: EncodedPoints,
    /// The server's blinded set.
    pub server_set: ServerSet,
}

impl Response {
    /// Write the response to `channel`. Does not flush.
    pub fn write<C: AbstractChannel>(&self, channel: &mut C) -> Result<(), Error> {
        channel.write_u8(self.group.id())?;
        match &self.server_set {
            ServerSet::Exact(_) => channel.write_u8(KIND_EXACT)?,
            ServerSet::Compressed(_) => channel.write_u8(KIND_COMPRESSED)?,
        }
        self.double_blinded.write(channel)?;
        match &self.server_set {
            ServerSet::Exact(points) => points.write(channel)?,
            ServerSet::Compressed(set) => {
                channel.write_u64(set.nkeys())?;
                channel.write_u64(set.nvalues())?;
                channel.write_u8(set.rice_bits())?;
                channel.write_u8(set.key_bits() as u8)?;
                channel.write_prefixed(set.blob())?;
            }
        }
        Ok(())
    }

    /// Read a response from `channel`.
    pub fn read<C: AbstractChannel>(channel: &mut C) -> Result<Self, Error> {
        let group = read_group(channel)?;
        let kind = channel.read_u8()?;
        let width = group.element_len();
        let double_blinded = EncodedPoints::read(channel, width)?;
        let server_set = match kind {
            KIND_EXACT => ServerSet::Exact(EncodedPoints::read(channel, width)?),
            KIND_COMPRESSED => {
                let nkeys = channel.read_u64()?;
                let nvalues = channel.read_u64()?;
                let rice_bits = channel.read_u8()?;
                let key_bits = channel.read_u8()?;
                let blob = channel.read_prefixed(MAX_MESSAGE_BYTES)?;
                ServerSet::Compressed(GolombCodedSet::from_parts(
                    nkeys, nvalues, rice_bits, key_bits, blob,
                )?)
            }
            other => return Err(Error::violation(format!("unknown response kind {}", other))),
        };
        Ok(Self {
            group,
            double_blinded,
            server_set,
        })
    }
}

// -*- mode: rust; -*-
//
// This file is part of `tincan`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

#![deny(missing_docs)]

//! Blocking byte channels between the two parties of a protocol run.
//!
//! The protocol code is written against [`AbstractChannel`]; concrete
//! channels wrap any `Read`/`Write` pair (TCP streams, Unix sockets, in-memory
//! buffers).

/// Module for encapsulating communication channels.
pub mod channel;

pub use crate::channel::{AbstractChannel, Channel, SyncChannel, TcpChannel, TrackChannel};

#[cfg(all(unix, feature = "unix_channel"))]
pub use crate::channel::{track_unix_channel_pair, unix_channel_pair, TrackUnixChannel, UnixChannel};

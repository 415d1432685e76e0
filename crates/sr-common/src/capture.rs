//! In-memory capture model.
//!
//! A [`Capture`] is an ordered list of named 1-bit [`Channel`]s sampled on a
//! shared clock. Channel order is significant: it decides the bit each
//! channel occupies in a packed sample word and its `probeN` index in the
//! session metadata.

use serde::{Deserialize, Serialize};

/// Maximum number of channels a single capture can carry (exclusive).
///
/// Every channel gets one bit of a single byte-wide sample word, with the
/// top bit left unused.
pub const MAX_CHANNELS: usize = 8;

/// Width in bits of every probe in a session dump.
pub const PROBE_BIT_WIDTH: u32 = 1;

/// A named single-bit signal and its recorded samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel name, unique within a capture.
    pub name: String,

    /// Bit width of each sample. Only 1-bit channels can be dumped.
    pub bit_width: u32,

    /// Recorded samples. Only the low bit of each value is meaningful.
    pub samples: Vec<u8>,
}

impl Channel {
    /// Create a 1-bit channel.
    pub fn new(name: impl Into<String>, samples: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bit_width: PROBE_BIT_WIDTH,
            samples,
        }
    }

    /// Override the bit width.
    pub fn with_width(mut self, bit_width: u32) -> Self {
        self.bit_width = bit_width;
        self
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the channel holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Bit value at `index` on the shared timeline.
    ///
    /// Indices past the recorded length read as 0.
    pub fn sample(&self, index: usize) -> u8 {
        match self.samples.get(index) {
            Some(value) => value & 0x1,
            None => 0,
        }
    }
}

/// A synchronized set of channels plus the rate they were sampled at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Channels in declaration order.
    pub channels: Vec<Channel>,

    /// Sample rate in Hz.
    pub sample_rate_hz: u64,
}

impl Capture {
    /// Create an empty capture.
    pub fn new(sample_rate_hz: u64) -> Self {
        Self {
            channels: Vec::new(),
            sample_rate_hz,
        }
    }

    /// Create a capture from existing channels.
    pub fn with_channels(channels: Vec<Channel>, sample_rate_hz: u64) -> Self {
        Self {
            channels,
            sample_rate_hz,
        }
    }

    /// Append a channel after the ones already declared.
    pub fn add(&mut self, channel: Channel) {
        self.channels.push(channel);
    }

    /// Find a channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Channel names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length of the shared timeline: the longest channel, or 0 when empty.
    pub fn timeline_len(&self) -> usize {
        self.channels.iter().map(Channel::len).max().unwrap_or(0)
    }
}

//! Packing of 1-bit channels into the `dump` sample stream.
//!
//! Each timestep becomes one big-endian word holding one bit per channel.
//! The first declared channel sits in bit 0, the last declared channel in
//! the highest populated bit. Words are written back to back with no
//! length prefix; the word count is implied by the stream length.

use crate::{DumpError, Result};
use sr_common::{Channel, MAX_CHANNELS, PROBE_BIT_WIDTH};
use tracing::debug;

/// Bytes in one packed word for `channel_count` probes.
pub fn bytes_per_word(channel_count: usize) -> usize {
    channel_count.div_ceil(8)
}

/// Reject captures that cannot be packed.
///
/// The channel count is checked first so an oversized capture always
/// reports [`DumpError::UnsupportedChannelCount`].
pub fn check_packable(channels: &[Channel]) -> Result<()> {
    if channels.len() >= MAX_CHANNELS {
        return Err(DumpError::UnsupportedChannelCount {
            count: channels.len(),
            max: MAX_CHANNELS - 1,
        });
    }

    if let Some(wide) = channels.iter().find(|c| c.bit_width != PROBE_BIT_WIDTH) {
        return Err(DumpError::UnsupportedBitWidth {
            channel: wide.name.clone(),
            width: wide.bit_width,
        });
    }

    Ok(())
}

/// Pack channels into a sample stream.
///
/// Channels shorter than the longest one read as 0 past their end.
pub fn encode(channels: &[Channel]) -> Result<Vec<u8>> {
    check_packable(channels)?;

    let word_bytes = bytes_per_word(channels.len());
    let timeline = channels.iter().map(Channel::len).max().unwrap_or(0);
    let mut out = Vec::with_capacity(timeline * word_bytes);

    for i in 0..timeline {
        let mut word: u64 = 0;
        for channel in channels.iter().rev() {
            word = (word << 1) | u64::from(channel.sample(i));
        }
        out.extend_from_slice(&word.to_be_bytes()[8 - word_bytes..]);
    }

    debug!(
        channels = channels.len(),
        samples = timeline,
        bytes = out.len(),
        "Encoded sample stream"
    );

    Ok(out)
}

/// Bit `bit` of a big-endian word, or 0 when the word is narrower.
fn word_bit(word: &[u8], bit: usize) -> u8 {
    let byte = bit / 8;
    if byte >= word.len() {
        return 0;
    }
    (word[word.len() - 1 - byte] >> (bit % 8)) & 0x1
}

/// Extract the samples of the probe at 1-indexed `probe` from a stream of
/// `channel_count`-probe words.
///
/// A trailing partial word ends the stream. Probe 0 and probes beyond the
/// word width read as 0.
pub fn decode_probe(packed: &[u8], channel_count: usize, probe: usize) -> Vec<u8> {
    let word_bytes = bytes_per_word(channel_count);
    if word_bytes == 0 {
        return Vec::new();
    }

    packed
        .chunks_exact(word_bytes)
        .map(|word| match probe.checked_sub(1) {
            Some(bit) => word_bit(word, bit),
            None => 0,
        })
        .collect()
}

/// Unpack a sample stream into one sequence per probe position.
///
/// `result[p - 1]` holds probe `p`; every sequence has one sample per
/// complete word in `packed`.
pub fn decode(packed: &[u8], channel_count: usize) -> Vec<Vec<u8>> {
    let decoded: Vec<Vec<u8>> = (1..=channel_count)
        .map(|probe| decode_probe(packed, channel_count, probe))
        .collect();

    debug!(
        channels = channel_count,
        samples = decoded.first().map_or(0, Vec::len),
        bytes = packed.len(),
        "Decoded sample stream"
    );

    decoded
}

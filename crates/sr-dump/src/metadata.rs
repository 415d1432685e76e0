//! The INI-like `metadata` entry.
//!
//! Writing emits a fixed header, the probe count, the sample rate and one
//! `probeN = name` line per channel. Reading is permissive: it scans for
//! `probeN = name` and `samplerate = N kHz|mHz` anywhere on a line and
//! skips everything else, so metadata written by other tools still loads.

use once_cell::sync::Lazy;
use regex::Regex;
use sr_common::Channel;
use tracing::warn;

/// Session format version written in the `[global]` section.
pub const SIGROK_VERSION: &str = "0.2.0";

/// Name of the sample stream entry, referenced by `capturefile`.
pub const CAPTURE_FILE: &str = "dump";

static RE_PROBE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)probe([0-9]+) = (\w+)").unwrap());

static RE_RATE_KHZ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)samplerate = ([0-9]+) kHz").unwrap());

static RE_RATE_MHZ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)samplerate = ([0-9]+) mHz").unwrap());

static RE_TOTAL_PROBES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)total probes = ([0-9]+)").unwrap());

static RE_PROBE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

/// Whether `name` survives a write/parse round trip as a probe name.
pub fn is_probe_name(name: &str) -> bool {
    RE_PROBE_NAME.is_match(name)
}

/// Value written after `samplerate = ` (labelled `KHz`).
///
/// This is the integer kHz rate doubled, which [`parse`] does not invert:
/// reading it back yields twice the original rate, truncated to whole kHz.
pub fn encoded_sample_rate(sample_rate_hz: u64) -> u64 {
    sample_rate_hz / 1000 * 2
}

/// Probe name → 1-based probe index, in first-seen order.
///
/// Re-inserting a name replaces its index but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeMap {
    entries: Vec<(String, usize)>,
}

impl ProbeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update `name`, returning the index it replaced.
    pub fn insert(&mut self, name: impl Into<String>, index: usize) -> Option<usize> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, index)),
            None => {
                self.entries.push((name, index));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, index)| *index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, index)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(n, i)| (n.as_str(), *i))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Parsed metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Probes in the order they appeared.
    pub probes: ProbeMap,

    /// Sample rate in Hz (the caller's default if no `samplerate` line).
    pub sample_rate_hz: u64,

    /// Value of `total probes`, if present.
    pub total_probes: Option<usize>,
}

/// Render the metadata for `channels` sampled at `sample_rate_hz`.
pub fn serialize(channels: &[Channel], sample_rate_hz: u64, driver: &str) -> String {
    let mut text = format!(
        "\n[global]\n\
         sigrok version = {SIGROK_VERSION}\n\
         [device 1]\n\
         driver = {driver}\n\
         capturefile = {CAPTURE_FILE}\n\
         unitsize = 1\n\
         total probes = {}\n\
         samplerate = {} KHz\n",
        channels.len(),
        encoded_sample_rate(sample_rate_hz),
    );

    for (i, channel) in channels.iter().enumerate() {
        text.push_str(&format!("probe{} = {}\n", i + 1, channel.name));
    }

    text
}

/// Parse metadata text. Never fails; unrecognized lines are skipped.
///
/// A probe index too large for `usize` saturates to `usize::MAX`, so the
/// probe is kept and decodes as all zeros. `probe0` lines are skipped.
pub fn parse(text: &str, default_sample_rate_hz: u64) -> Metadata {
    let mut probes = ProbeMap::new();
    let mut sample_rate_hz = default_sample_rate_hz;
    let mut total_probes = None;

    for line in text.lines() {
        if let Some(caps) = RE_PROBE.captures(line) {
            // Only digits are captured, so the parse can fail on overflow alone.
            let index = caps[1].parse::<usize>().unwrap_or(usize::MAX);
            if index == 0 {
                warn!(line, "Ignoring probe line with index 0");
            } else {
                let name = &caps[2];
                if let Some(previous) = probes.insert(name, index) {
                    warn!(name, previous, index, "Duplicate probe name, keeping last index");
                }
            }
        }

        for (re, scale) in [(&*RE_RATE_KHZ, 1_000u64), (&*RE_RATE_MHZ, 1_000_000u64)] {
            if let Some(caps) = re.captures(line) {
                match caps[1]
                    .parse::<u64>()
                    .ok()
                    .and_then(|value| value.checked_mul(scale))
                {
                    Some(rate) => sample_rate_hz = rate,
                    None => warn!(line, "Ignoring out-of-range sample rate"),
                }
            }
        }

        if let Some(caps) = RE_TOTAL_PROBES.captures(line) {
            total_probes = caps[1].parse::<usize>().ok();
        }
    }

    if let Some(total) = total_probes {
        if total != probes.len() {
            warn!(
                total_probes = total,
                probe_lines = probes.len(),
                "Metadata probe count disagrees with probe lines"
            );
        }
    }

    Metadata {
        probes,
        sample_rate_hz,
        total_probes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_RATE: u64 = 100_000_000;

    #[test]
    fn test_serialize_layout() {
        let channels = vec![Channel::new("clk", vec![]), Channel::new("data", vec![])];
        let text = serialize(&channels, 1_000_000, "sr-dump");

        let expected = "\n[global]\n\
                        sigrok version = 0.2.0\n\
                        [device 1]\n\
                        driver = sr-dump\n\
                        capturefile = dump\n\
                        unitsize = 1\n\
                        total probes = 2\n\
                        samplerate = 2000 KHz\n\
                        probe1 = clk\n\
                        probe2 = data\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_encoded_sample_rate_doubles_and_truncates() {
        assert_eq!(encoded_sample_rate(1_000_000), 2_000);
        assert_eq!(encoded_sample_rate(1_999), 2);
        assert_eq!(encoded_sample_rate(999), 0);
    }

    #[test]
    fn test_parse_serialized_metadata() {
        let channels = vec![
            Channel::new("X", vec![]),
            Channel::new("Y", vec![]),
            Channel::new("Z", vec![]),
        ];
        let meta = parse(&serialize(&channels, 500_000, "sr-dump"), DEFAULT_RATE);

        assert_eq!(meta.probes.names(), vec!["X", "Y", "Z"]);
        assert_eq!(meta.probes.get("Z"), Some(3));
        assert_eq!(meta.total_probes, Some(3));
        // Written as 1000 KHz, read back as 1 MHz.
        assert_eq!(meta.sample_rate_hz, 1_000_000);
    }

    #[test]
    fn test_parse_ignores_unknown_lines() {
        let text = "foo = bar\n[weird section]\nprobe1 = a\n;; comment\n";
        let meta = parse(text, DEFAULT_RATE);

        assert_eq!(meta.probes.names(), vec!["a"]);
        assert_eq!(meta.sample_rate_hz, DEFAULT_RATE);
        assert_eq!(meta.total_probes, None);
    }

    #[test]
    fn test_parse_sample_rate_units() {
        assert_eq!(parse("samplerate = 500 kHz", DEFAULT_RATE).sample_rate_hz, 500_000);
        assert_eq!(parse("samplerate = 2 mHz", DEFAULT_RATE).sample_rate_hz, 2_000_000);
        assert_eq!(parse("SampleRate = 3 MHZ", DEFAULT_RATE).sample_rate_hz, 3_000_000);
    }

    #[test]
    fn test_parse_later_sample_rate_wins() {
        let meta = parse("samplerate = 2 mHz\nsamplerate = 500 kHz\n", DEFAULT_RATE);
        assert_eq!(meta.sample_rate_hz, 500_000);

        let meta = parse("samplerate = 500 kHz\nsamplerate = 2 mHz\n", DEFAULT_RATE);
        assert_eq!(meta.sample_rate_hz, 2_000_000);
    }

    #[test]
    fn test_parse_unsupported_rate_unit_keeps_default() {
        let meta = parse("samplerate = 12 Hz", 42);
        assert_eq!(meta.sample_rate_hz, 42);
    }

    #[test]
    fn test_parse_overflowing_rate_is_skipped() {
        let text = "samplerate = 5 kHz\nsamplerate = 99999999999999999999 kHz\nsamplerate = 18446744073709551 mHz\n";
        let meta = parse(text, DEFAULT_RATE);
        assert_eq!(meta.sample_rate_hz, 5_000);
    }

    #[test]
    fn test_parse_probe_case_insensitive() {
        let meta = parse("PROBE2 = b\nProbe1 = a\n", DEFAULT_RATE);
        assert_eq!(meta.probes.names(), vec!["b", "a"]);
        assert_eq!(meta.probes.get("b"), Some(2));
    }

    #[test]
    fn test_parse_duplicate_name_overwrites_in_place() {
        let meta = parse("probe1 = a\nprobe2 = b\nprobe3 = a\n", DEFAULT_RATE);
        assert_eq!(meta.probes.names(), vec!["a", "b"]);
        assert_eq!(meta.probes.get("a"), Some(3));
    }

    #[test]
    fn test_parse_skips_probe_zero() {
        let meta = parse("probe0 = bad\nprobe1 = good\n", DEFAULT_RATE);
        assert_eq!(meta.probes.names(), vec!["good"]);
    }

    #[test]
    fn test_parse_keeps_probe_with_oversized_index() {
        let meta = parse("probe1 = a\nprobe99999999999999999999999 = far\n", DEFAULT_RATE);
        assert_eq!(meta.probes.names(), vec!["a", "far"]);
        assert_eq!(meta.probes.get("far"), Some(usize::MAX));
    }

    #[test]
    fn test_probe_map_insert() {
        let mut map = ProbeMap::new();
        assert!(map.is_empty());
        assert_eq!(map.insert("a", 1), None);
        assert_eq!(map.insert("b", 2), None);
        assert_eq!(map.insert("a", 5), Some(1));

        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![("a", 5), ("b", 2)]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_is_probe_name() {
        assert!(is_probe_name("clk"));
        assert!(is_probe_name("data_0"));
        assert!(!is_probe_name(""));
        assert!(!is_probe_name("a-b"));
        assert!(!is_probe_name("two words"));
    }
}

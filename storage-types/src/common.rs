//! Common utility types shared across records

use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// One gibibyte.
pub const GIB: u64 = 1024 * MIB;

/// Smallest gap between partitions that is shown as free space.
///
/// UDisks2, libblockdev and libparted each round partition starts up to their
/// own alignment, which leaves a few megabytes between partitions that cannot
/// be used for anything. The worst case seen is the first logical partition
/// inside an extended partition, which leaves 2 MiB.
pub const MIN_FREE_SPACE_BYTES: u64 = 3 * MIB;

/// A byte range representing a contiguous region of a device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    /// Start byte (inclusive)
    pub start: u64,

    /// End byte (exclusive)
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, size: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(size),
        }
    }

    /// Whether `other` lies completely inside this range
    pub fn contains(&self, other: &ByteRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Get the size of this range in bytes
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

const UNITS: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

fn scaled(bytes: u64) -> (f64, usize) {
    let mut steps = 0;
    let mut val = bytes as f64;

    while val >= 1024. && steps < UNITS.len() - 1 {
        val /= 1024.;
        steps += 1;
    }

    (val, steps)
}

/// Convert bytes to a short human-readable size (e.g. "1.5 GiB")
pub fn fmt_size(bytes: u64) -> String {
    let (val, steps) = scaled(bytes);
    if steps == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", val, UNITS[steps])
    }
}

/// Convert bytes to a size that also carries the exact byte count
/// (e.g. "1.5 GiB, 1,610,612,736 bytes")
pub fn fmt_size_long(bytes: u64) -> String {
    let exact = bytes.to_formatted_string(&Locale::en);
    if bytes < 1024 {
        format!("{} bytes", exact)
    } else {
        format!("{}, {} bytes", fmt_size(bytes), exact)
    }
}

/// Parse a human-readable size back into bytes (e.g. "1.5 GiB")
pub fn parse_size(pretty: &str) -> Result<u64> {
    let split = pretty.split_whitespace().collect::<Vec<&str>>();
    let string_value = split
        .first()
        .ok_or_else(|| anyhow::anyhow!("Invalid input"))?;

    let mut val: f64 = string_value.parse()?;
    if val < 0. {
        return Err(anyhow::anyhow!("Negative size: {}", pretty));
    }
    let unit = if split.len() > 1 {
        *split
            .last()
            .ok_or_else(|| anyhow::anyhow!("Invalid input"))?
    } else {
        "B"
    };

    let steps = UNITS
        .iter()
        .position(|u| u.eq_ignore_ascii_case(unit))
        .ok_or_else(|| anyhow::anyhow!("Invalid unit: {}", unit))?;

    for _ in 0..steps {
        val *= 1024.;
    }

    Ok(val as u64)
}

/// Round `value` up to the next multiple of `step`; `None` when that does
/// not fit in a `u64`
pub fn round_up(value: u64, step: u64) -> Option<u64> {
    if step == 0 {
        return Some(value);
    }
    value.div_ceil(step).checked_mul(step)
}

/// Format a temperature reported in kelvin as degrees Celsius
pub fn format_temperature(kelvin: f64) -> String {
    let celsius = kelvin - 273.15;
    let fahrenheit = celsius * 9.0 / 5.0 + 32.0;
    format!("{:.0}° C / {:.0}° F", celsius, fahrenheit)
}

/// Split a comma-delimited mount/crypt options string into trimmed tokens.
pub fn split_options(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Drop the `x-parent*` tokens UDisks2 adds for `track-parents` items.
pub fn strip_parent_options(input: &str) -> String {
    split_options(input)
        .into_iter()
        .filter(|t| !t.starts_with("x-parent"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_size_uses_binary_units() {
        assert_eq!(fmt_size(512), "512 B");
        assert_eq!(fmt_size(1024), "1.0 KiB");
        assert_eq!(fmt_size(3 * MIB), "3.0 MiB");
        assert_eq!(fmt_size(10 * 1024 * MIB), "10.0 GiB");
    }

    #[test]
    fn fmt_size_long_carries_exact_bytes() {
        assert_eq!(fmt_size_long(1024 * MIB), "1.0 GiB, 1,073,741,824 bytes");
        assert_eq!(fmt_size_long(100), "100 bytes");
    }

    #[test]
    fn parse_size_accepts_units() {
        assert_eq!(parse_size("1.5 GiB").unwrap(), 1536 * MIB);
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert!(parse_size("12 parsecs").is_err());
    }

    #[test]
    fn strip_parent_options_keeps_user_tokens() {
        assert_eq!(
            strip_parent_options("noauto,x-parent=abc, nofail"),
            "noauto,nofail"
        );
    }

    #[test]
    fn round_up_to_extent() {
        assert_eq!(round_up(5, 4), Some(8));
        assert_eq!(round_up(8, 4), Some(8));
        assert_eq!(round_up(7, 0), Some(7));
        assert_eq!(round_up(u64::MAX - 1, 4 * 1024 * 1024), None);
    }
}

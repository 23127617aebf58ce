//! Runtime configuration parsing and validation.
//!
//! The read buffer size is the only tunable with a material effect on
//! throughput. It must be a power of two so that refills stay page aligned,
//! and it bounds the longest line the chunked driver can accept.

use crate::measurements::{MeasureError, Result};
use crate::streaming::buffers::{MAX_READ_BUFFER, MIN_READ_BUFFER};

/// Parse a byte size such as `4M`, `256K`, `1G` or `65536`.
///
/// Suffixes are binary multiples (`K` = 1024). An optional trailing `B`
/// or `iB` is accepted, so `4MB` and `4MiB` both mean 4 * 1024 * 1024.
pub fn parse_byte_size(s: &str) -> Result<usize> {
    let normalized = s.trim().to_uppercase();
    let trimmed = normalized
        .strip_suffix("IB")
        .or_else(|| normalized.strip_suffix('B'))
        .unwrap_or(normalized.as_str());

    let (digits, shift) = match trimmed.chars().last() {
        Some('K') => (&trimmed[..trimmed.len() - 1], 10),
        Some('M') => (&trimmed[..trimmed.len() - 1], 20),
        Some('G') => (&trimmed[..trimmed.len() - 1], 30),
        _ => (trimmed, 0),
    };

    digits
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(1usize << shift))
        .ok_or_else(|| {
            MeasureError::InvalidConfig(format!(
                "Invalid size '{}'. Use formats like 64K, 4M, 1G",
                s
            ))
        })
}

/// Check that a read buffer size is a power of two within the supported range.
pub fn validate_buffer_size(size: usize) -> Result<usize> {
    if !size.is_power_of_two() {
        return Err(MeasureError::InvalidConfig(format!(
            "Buffer size {} is not a power of two",
            size
        )));
    }
    if !(MIN_READ_BUFFER..=MAX_READ_BUFFER).contains(&size) {
        return Err(MeasureError::InvalidConfig(format!(
            "Buffer size {} is outside {}..={}",
            size, MIN_READ_BUFFER, MAX_READ_BUFFER
        )));
    }
    Ok(size)
}

/// Parse and validate a read buffer size in one step.
pub fn parse_buffer_size(s: &str) -> Result<usize> {
    parse_byte_size(s).and_then(validate_buffer_size)
}

/// Parse a record count such as `1000`, `10K`, `1M` or `1G`.
///
/// Suffixes are decimal multiples (`K` = 1000).
pub fn parse_count(s: &str) -> Result<u64> {
    let s_upper = s.trim().to_uppercase();
    let (digits, multiplier) = match s_upper.chars().last() {
        Some('K') => (&s_upper[..s_upper.len() - 1], 1_000u64),
        Some('M') => (&s_upper[..s_upper.len() - 1], 1_000_000u64),
        Some('G') => (&s_upper[..s_upper.len() - 1], 1_000_000_000u64),
        _ => (s_upper.as_str(), 1u64),
    };

    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| {
            MeasureError::InvalidConfig(format!(
                "Invalid count '{}'. Use formats like 1000, 10K, 1M",
                s
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("65536").unwrap(), 65536);
        assert_eq!(parse_byte_size("64K").unwrap(), 64 * 1024);
        assert_eq!(parse_byte_size("4m").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_byte_size("4MB").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_byte_size("4MiB").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_byte_size("1G").unwrap(), 1 << 30);
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("M").is_err());
        assert!(parse_byte_size("four").is_err());
    }

    #[test]
    fn test_validate_buffer_size() {
        assert_eq!(validate_buffer_size(4 * 1024 * 1024).unwrap(), 4 * 1024 * 1024);
        assert_eq!(validate_buffer_size(MIN_READ_BUFFER).unwrap(), MIN_READ_BUFFER);
        assert!(validate_buffer_size(3000).is_err());
        assert!(validate_buffer_size(MIN_READ_BUFFER / 2).is_err());
        assert!(validate_buffer_size(MAX_READ_BUFFER * 2).is_err());
        assert!(validate_buffer_size(0).is_err());
    }

    #[test]
    fn test_parse_buffer_size() {
        assert_eq!(parse_buffer_size("1M").unwrap(), 1 << 20);
        let err = parse_buffer_size("1000").unwrap_err();
        assert!(err.to_string().contains("power of two"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("100").unwrap(), 100);
        assert_eq!(parse_count("10k").unwrap(), 10_000);
        assert_eq!(parse_count("1M").unwrap(), 1_000_000);
        assert_eq!(parse_count("1G").unwrap(), 1_000_000_000);
        assert!(parse_count("").is_err());
        assert!(parse_count("-5").is_err());
    }
}

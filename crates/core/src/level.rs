//! Parsing of injected workload values.

use crate::error::CoreError;
use crate::limits::{MAX_WORKLOAD_LEVEL, MAX_WRITE_LEN};

/// Parse a write payload as a decimal workload level.
///
/// Accepts an optional leading `+` and a single trailing newline, the way
/// shell `echo` output arrives. Values above [`MAX_WORKLOAD_LEVEL`] are
/// clamped; anything that is not a non-negative integer is rejected.
pub fn parse_level(payload: &[u8]) -> Result<u64, CoreError> {
    if payload.len() > MAX_WRITE_LEN {
        return Err(CoreError::Validation(format!(
            "payload is {} bytes, at most {MAX_WRITE_LEN} allowed",
            payload.len()
        )));
    }

    let text = std::str::from_utf8(payload)
        .map_err(|_| CoreError::Validation("workload must be ASCII digits".to_string()))?;
    let text = text.strip_suffix('\n').unwrap_or(text);

    if text.is_empty() {
        return Err(CoreError::Validation("workload must not be empty".to_string()));
    }

    let value: u64 = text
        .parse()
        .map_err(|_| CoreError::Validation(format!("invalid workload value: {text:?}")))?;

    Ok(value.min(MAX_WORKLOAD_LEVEL))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accepts_plain_and_newline_terminated() {
        assert_eq!(parse_level(b"42").unwrap(), 42);
        assert_eq!(parse_level(b"85\n").unwrap(), 85);
        assert_eq!(parse_level(b"+7").unwrap(), 7);
        assert_eq!(parse_level(b"0").unwrap(), 0);
    }

    #[test]
    fn clamps_above_max() {
        assert_eq!(parse_level(b"101").unwrap(), MAX_WORKLOAD_LEVEL);
        assert_eq!(parse_level(b"99999").unwrap(), MAX_WORKLOAD_LEVEL);
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert_matches!(parse_level(b"-5"), Err(CoreError::Validation(_)));
        assert_matches!(parse_level(b"abc"), Err(CoreError::Validation(_)));
        assert_matches!(parse_level(b"12abc"), Err(CoreError::Validation(_)));
        assert_matches!(parse_level(b" 12"), Err(CoreError::Validation(_)));
        assert_matches!(parse_level(b""), Err(CoreError::Validation(_)));
        assert_matches!(parse_level(b"\n"), Err(CoreError::Validation(_)));
        assert_matches!(parse_level(b"5\n\n"), Err(CoreError::Validation(_)));
        assert_matches!(parse_level(&[0xff, 0x31]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_overflowing_integer() {
        assert_matches!(
            parse_level(b"99999999999999999999999"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_oversized_payload() {
        let payload = vec![b'1'; MAX_WRITE_LEN + 1];
        assert_matches!(parse_level(&payload), Err(CoreError::Validation(msg)) if msg.contains("256 bytes"));

        let mut padded = vec![b'0'; MAX_WRITE_LEN - 2];
        padded.extend_from_slice(b"42");
        assert_eq!(parse_level(&padded).unwrap(), 42);
    }
}

//! `track_id` canonicalization, applied on both sides of every lookup.
//!
//! A prior version of this pipeline canonicalized with `doc_id.parse::<u32>()`
//! then `to_string()`, which silently truncated leading zeros ("034996" ->
//! "34996") and split an id across two postings. Zero-padding to a fixed
//! width is the only form that round-trips.

const TRACK_ID_WIDTH: usize = 6;

/// Canonicalize a track identifier: zero-pad decimal ids to 6 digits,
/// pass through anything else unchanged. Idempotent.
pub fn normalize_track_id(id: &str) -> String {
    let trimmed = id.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>width$}", trimmed, width = TRACK_ID_WIDTH)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_decimal_ids() {
        assert_eq!(normalize_track_id("34996"), "034996");
        assert_eq!(normalize_track_id("034996"), "034996");
        assert_eq!(normalize_track_id("1"), "000001");
    }

    #[test]
    fn passes_through_non_decimal_ids() {
        assert_eq!(normalize_track_id("abc123"), "abc123");
        assert_eq!(normalize_track_id(""), "");
    }

    #[test]
    fn does_not_truncate_longer_ids() {
        assert_eq!(normalize_track_id("1234567"), "1234567");
    }

    #[test]
    fn is_idempotent() {
        for id in ["34996", "034996", "abc", "", "1234567"] {
            let once = normalize_track_id(id);
            let twice = normalize_track_id(&once);
            assert_eq!(once, twice);
        }
    }
}

use std::sync::OnceLock;

use regex::Regex;

static ISO_DURATION_RE: OnceLock<Regex> = OnceLock::new();

/// Parses an ISO-8601 video duration (`PT4M13S`, `PT1H30M`) into seconds.
/// Absent groups count as zero; anything unparseable comes back as zero
/// rather than an error, since upstream duration strings are advisory.
pub fn parse_duration(iso: &str) -> i64 {
    let re = ISO_DURATION_RE
        .get_or_init(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap());

    let Some(caps) = re.captures(iso) else {
        return 0;
    };

    let group = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };

    group(1) * 3600 + group(2) * 60 + group(3)
}

/// Renders seconds as `"1h 30m"`, or `"45m"` below an hour. Leftover seconds
/// are truncated, not rounded.
pub fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Compact count rendering for like/view totals: `532`, `71.5K`, `1.2M`.
pub fn format_count(num: i64) -> String {
    if num < 1_000 {
        num.to_string()
    } else if num < 1_000_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!(parse_duration("PT4M13S"), 253);
    }

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(parse_duration("PT1H30M"), 5400);
    }

    #[test]
    fn parses_all_groups() {
        assert_eq!(parse_duration("PT2H5M9S"), 7509);
    }

    #[test]
    fn malformed_input_is_zero() {
        assert_eq!(parse_duration("garbage"), 0);
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("PT"), 0);
    }

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_duration(3661), "1h 1m");
        assert_eq!(format_duration(125), "2m");
        assert_eq!(format_duration(0), "0m");
    }

    #[test]
    fn formats_counts_across_magnitudes() {
        assert_eq!(format_count(532), "532");
        assert_eq!(format_count(71_500), "71.5K");
        assert_eq!(format_count(1_200_000), "1.2M");
        assert_eq!(format_count(1_000), "1.0K");
    }
}

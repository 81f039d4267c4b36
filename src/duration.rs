//! Human-readable durations for the `timeout` config key ("500ms", "30s", "2m", "1h").

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

/// Parse a duration string like "30s" or "2m".
///
/// Supported units: `ms`, `s`, `m`, `h`. Case-insensitive, whitespace trimmed.
///
/// ```
/// use conoha_swift::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    // "ms" must be checked before "s" and "m".
    let (num, millis_per_unit) = if let Some(num) = s.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1_000)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60 * 1_000)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, 60 * 60 * 1_000)
    } else {
        bail!("Duration {s:?} must end with ms, s, m, or h");
    };

    let num: u64 = num
        .trim()
        .parse()
        .with_context(|| format!("Invalid number in duration {s:?}"))?;
    let millis = num
        .checked_mul(millis_per_unit)
        .with_context(|| format!("Duration {s:?} is too large"))?;

    Ok(Duration::from_millis(millis))
}

/// Format a duration using the largest unit that divides it exactly.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }
    if millis % (60 * 60 * 1_000) == 0 {
        format!("{}h", millis / (60 * 60 * 1_000))
    } else if millis % (60 * 1_000) == 0 {
        format!("{}m", millis / (60 * 1_000))
    } else if millis % 1_000 == 0 {
        format!("{}s", millis / 1_000)
    } else {
        format!("{millis}ms")
    }
}

/// Serde adapter for `Option<Duration>` stored as a duration string.
pub mod option {
    use super::*;

    pub fn serialize<S>(
        value: &Option<Duration>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse_duration(&s).map_err(|e| de::Error::custom(format!("{e:#}"))))
            .transpose()
    }
}

use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// The Laravel API emits either RFC 3339 or `Y-m-d H:i:s` in UTC.
pub fn parse_api_timestamp(s: &str) -> Option<DateTime<Utc>> {
    from_rfc3339(s).ok().or_else(|| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_api_formats() {
        let a = parse_api_timestamp("2025-02-01T10:00:00Z").unwrap();
        let b = parse_api_timestamp("2025-02-01 10:00:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_api_timestamp("yesterday").is_none());
    }
}

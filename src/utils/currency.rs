use chrono::{DateTime, Utc};

use crate::models::job::JobPosting;

const COUNTRY_CURRENCIES: &[(&str, &str)] = &[
    ("United Arab Emirates", "AED"),
    ("UAE", "AED"),
    ("Saudi Arabia", "SAR"),
    ("Qatar", "QAR"),
    ("Kuwait", "KWD"),
    ("Bahrain", "BHD"),
    ("Oman", "OMR"),
    ("United Kingdom", "GBP"),
    ("UK", "GBP"),
    ("United States", "USD"),
    ("USA", "USD"),
    ("India", "INR"),
    ("Pakistan", "PKR"),
    ("Philippines", "PHP"),
    ("Egypt", "EGP"),
];

pub const DEFAULT_CURRENCY: &str = "USD";

pub fn currency_for_country(country: &str) -> &'static str {
    COUNTRY_CURRENCIES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(country.trim()))
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_CURRENCY)
}

/// A job's explicit currency wins over the one implied by its country.
pub fn job_currency(job: &JobPosting) -> String {
    job.currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| currency_for_country(&job.country).to_string())
}

pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `"2501-3000"` → `"AED 2,501 - 3,000"`, `"5001+"` → `"AED 5,001+"`.
/// Anything unparseable is shown as given, prefixed with the currency.
pub fn format_salary_range(range: &str, currency: &str) -> String {
    let range = range.trim();
    if let Some(low) = range.strip_suffix('+') {
        if let Ok(n) = low.trim().parse::<u64>() {
            return format!("{} {}+", currency, format_amount(n));
        }
    }
    if let Some((low, high)) = range.split_once('-') {
        if let (Ok(lo), Ok(hi)) = (low.trim().parse::<u64>(), high.trim().parse::<u64>()) {
            return format!("{} {} - {}", currency, format_amount(lo), format_amount(hi));
        }
    }
    format!("{} {}", currency, range)
}

pub fn format_display_date(ts: DateTime<Utc>) -> String {
    ts.format("%-d %b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures;
    use chrono::TimeZone;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(950), "950");
        assert_eq!(format_amount(2501), "2,501");
        assert_eq!(format_amount(1234567), "1,234,567");
    }

    #[test]
    fn salary_ranges() {
        assert_eq!(format_salary_range("2501-3000", "AED"), "AED 2,501 - 3,000");
        assert_eq!(format_salary_range("5001+", "SAR"), "SAR 5,001+");
        assert_eq!(format_salary_range("negotiable", "USD"), "USD negotiable");
    }

    #[test]
    fn currency_override_wins() {
        let mut job = fixtures::jobs().remove(0);
        job.country = "Saudi Arabia".into();
        job.currency = None;
        assert_eq!(job_currency(&job), "SAR");
        job.currency = Some(" gbp ".into());
        assert_eq!(job_currency(&job), "GBP");
        job.country = "Atlantis".into();
        job.currency = None;
        assert_eq!(job_currency(&job), "USD");
    }

    #[test]
    fn display_date() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(format_display_date(ts), "5 Mar 2025");
    }
}

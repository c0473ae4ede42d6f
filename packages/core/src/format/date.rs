use chrono::{Duration, Local, NaiveDate};

pub const BR_FORMAT: &str = "%d/%m/%Y";
pub const ISO_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `dd/mm/yyyy`
    Br,
    /// `yyyy-mm-dd`
    Iso,
    /// `dd/mm`
    DayMonth,
    /// `mm/yyyy`
    MonthYear,
}

impl DateStyle {
    fn pattern(self) -> &'static str {
        match self {
            DateStyle::Br => BR_FORMAT,
            DateStyle::Iso => ISO_FORMAT,
            DateStyle::DayMonth => "%d/%m",
            DateStyle::MonthYear => "%m/%Y",
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts `dd/mm/yyyy`, `yyyy-mm-dd` and ISO timestamps (only the date part
/// is kept).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, BR_FORMAT) {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, ISO_FORMAT) {
        return Some(date);
    }
    text.get(..10)
        .filter(|_| matches!(text.as_bytes().get(10), Some(b'T') | Some(b' ')))
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, ISO_FORMAT).ok())
}

pub fn format_date(date: NaiveDate, style: DateStyle) -> String {
    date.format(style.pattern()).to_string()
}

/// `"05/01/2024"` → `"2024-01-05"`.
pub fn br_to_iso(text: &str) -> Option<String> {
    NaiveDate::parse_from_str(text.trim(), BR_FORMAT)
        .ok()
        .map(|d| format_date(d, DateStyle::Iso))
}

/// Signed number of days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn is_today(date: NaiveDate, today: NaiveDate) -> bool {
    date == today
}

pub fn is_tomorrow(date: NaiveDate, today: NaiveDate) -> bool {
    date == today + Duration::days(1)
}

/// Progressive `DD/MM/AAAA` mask, at most eight digits.
pub fn mask_date_input(text: &str) -> String {
    let digits: String = text.chars().filter(char::is_ascii_digit).take(8).collect();
    match digits.len() {
        0..=2 => digits,
        3..=4 => format!("{}/{}", &digits[..2], &digits[2..]),
        _ => format!("{}/{}/{}", &digits[..2], &digits[2..4], &digits[4..]),
    }
}

/// Serde adapter for dates exchanged as `dd/mm/yyyy`.
pub mod br_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(super::BR_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date: {:?}", raw)))
    }
}

/// Like [`br_date`] but `null`, a missing field or `""` decode to `None`.
pub mod br_date_opt {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(super::BR_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_date(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date: {:?}", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_both_wire_formats() {
        assert_eq!(parse_date("05/01/2024"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05T13:45:00"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05 13:45:00"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn formats_every_style() {
        let date = d(2024, 3, 9);
        assert_eq!(format_date(date, DateStyle::Br), "09/03/2024");
        assert_eq!(format_date(date, DateStyle::Iso), "2024-03-09");
        assert_eq!(format_date(date, DateStyle::DayMonth), "09/03");
        assert_eq!(format_date(date, DateStyle::MonthYear), "03/2024");
    }

    #[test]
    fn br_to_iso_conversion() {
        assert_eq!(br_to_iso("09/03/2024").as_deref(), Some("2024-03-09"));
        assert_eq!(br_to_iso("2024-03-09"), None);
    }

    #[test]
    fn relative_day_helpers() {
        let today = d(2024, 12, 31);
        assert_eq!(days_between(today, d(2025, 1, 10)), 10);
        assert_eq!(days_between(d(2025, 1, 10), today), -10);
        assert!(is_today(today, today));
        assert!(is_tomorrow(d(2025, 1, 1), today));
        assert!(!is_tomorrow(today, today));
    }

    #[test]
    fn date_mask_is_progressive() {
        assert_eq!(mask_date_input("0"), "0");
        assert_eq!(mask_date_input("0501"), "05/01");
        assert_eq!(mask_date_input("05012024"), "05/01/2024");
        assert_eq!(mask_date_input("0501202499"), "05/01/2024");
    }

    #[derive(Serialize, Deserialize)]
    struct Row {
        #[serde(with = "br_date")]
        data: NaiveDate,
        #[serde(with = "br_date_opt", default)]
        vencimento: Option<NaiveDate>,
    }

    #[test]
    fn serde_adapters_read_and_write_br_dates() {
        let row: Row = serde_json::from_str(r#"{"data": "2024-02-01", "vencimento": ""}"#).unwrap();
        assert_eq!(row.data, d(2024, 2, 1));
        assert_eq!(row.vencimento, None);

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["data"], "01/02/2024");
        assert!(json["vencimento"].is_null());

        let missing: Row = serde_json::from_str(r#"{"data": "01/02/2024"}"#).unwrap();
        assert_eq!(missing.vencimento, None);
    }
}

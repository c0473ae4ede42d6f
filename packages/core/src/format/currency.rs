//! Brazilian Real formatting, parsing and input masking.
//!
//! Amounts are carried as `f64` and rounded to whole cents at the edges
//! (rendering, serialisation). Grouping uses `.` for thousands and `,` for
//! decimals, as pt-BR does.

use serde::{de, Deserialize, Deserializer, Serializer};

pub const CURRENCY_SYMBOL: &str = "R$";

/// Round to whole cents, half away from zero.
pub fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Insert a `.` between every group of three digits, counting from the right.
pub fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `1234.5` → `"1.234,50"`.
pub fn format_brl_plain(value: f64) -> String {
    let cents = to_cents(value);
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!(
        "{}{},{:02}",
        sign,
        group_thousands(&(abs / 100).to_string()),
        abs % 100
    )
}

/// `1234.5` → `"R$ 1.234,50"`; negatives render as `"-R$ 1,00"`.
pub fn format_brl(value: f64) -> String {
    let plain = format_brl_plain(value);
    match plain.strip_prefix('-') {
        Some(rest) => format!("-{} {}", CURRENCY_SYMBOL, rest),
        None => format!("{} {}", CURRENCY_SYMBOL, plain),
    }
}

/// pt-BR number with a fixed number of decimals: `format_number(1234.567, 1)`
/// → `"1.234,6"`.
pub fn format_number(value: f64, decimals: u32) -> String {
    let scale = 10u64.pow(decimals);
    let scaled = (value.abs() * scale as f64).round() as u64;
    let sign = if value < 0.0 && scaled != 0 { "-" } else { "" };
    let integer = group_thousands(&(scaled / scale).to_string());
    if decimals == 0 {
        format!("{}{}", sign, integer)
    } else {
        format!(
            "{}{},{:0width$}",
            sign,
            integer,
            scaled % scale,
            width = decimals as usize
        )
    }
}

/// Parse a user- or backend-supplied amount.
///
/// A comma is always the decimal separator. Without a comma, a lone dot
/// followed by exactly three digits, or several dots, are thousands
/// separators; otherwise the dot is decimal.
pub fn parse_brl(text: &str) -> Option<f64> {
    let cleaned: String = text
        .replace(CURRENCY_SYMBOL, "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();

    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    if body.is_empty() {
        return None;
    }

    let normalized = if let Some(pos) = body.rfind(',') {
        let integer = body[..pos].replace('.', "");
        let fraction = &body[pos + 1..];
        format!("{}.{}", integer, fraction)
    } else {
        let dots = body.matches('.').count();
        let thousands_only = dots > 1
            || (dots == 1 && body.rsplit('.').next().map(str::len) == Some(3));
        if thousands_only {
            body.replace('.', "")
        } else {
            body.to_string()
        }
    };

    if normalized.is_empty()
        || normalized == "."
        || !normalized.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }

    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// As-typed currency masking: keeps digits and the last comma, limits the
/// decimal part to two digits and regroups thousands.
pub fn mask_currency_input(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if kept.is_empty() {
        return kept;
    }

    match kept.rfind(',') {
        Some(pos) => {
            let integer: String = kept[..pos].chars().filter(char::is_ascii_digit).collect();
            let decimals: String = kept[pos + 1..]
                .chars()
                .filter(char::is_ascii_digit)
                .take(2)
                .collect();
            format!("{},{}", group_thousands(&integer), decimals)
        }
        None => {
            let integer: String = kept.chars().filter(char::is_ascii_digit).collect();
            group_thousands(&integer)
        }
    }
}

/// Longest amount the cents mask accepts; extra digits are dropped.
const MAX_CENTS_DIGITS: usize = 15;

/// Digits-as-cents masking used by the sale form: `"123456"` → `"1.234,56"`.
pub fn mask_cents_input(text: &str) -> String {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return digits;
    }
    let significant: String = digits
        .trim_start_matches('0')
        .chars()
        .take(MAX_CENTS_DIGITS)
        .collect();
    let cents: u64 = significant.parse().unwrap_or(0);
    format!(
        "{},{:02}",
        group_thousands(&(cents / 100).to_string()),
        cents % 100
    )
}

/// Accepts a JSON number or a pt-BR formatted string.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => parse_brl(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid monetary value: {:?}", s))),
    }
}

/// Sends amounts the way the backend's forms expect them: `"15.590,85"`.
pub fn serialize_plain<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_brl_plain(*value))
}

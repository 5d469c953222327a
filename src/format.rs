// Display formatting for prices, dates and scores

use chrono::{DateTime, NaiveDate};

const CURRENCY: &str = "LKR";

/// "LKR 2,500,000" for "2500000.00"; "N/A" when the price is missing or not a number.
pub fn format_price(price: Option<&str>) -> String {
    let Some(value) = price
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|v| v.is_finite())
    else {
        return "N/A".to_string();
    };

    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    let whole = group_thousands(cents / 100);
    let fraction = match cents % 100 {
        0 => String::new(),
        f if f % 10 == 0 => format!(".{}", f / 10),
        f => format!(".{f:02}"),
    };
    format!("{CURRENCY} {sign}{whole}{fraction}")
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

/// One decimal and a percent sign: "82.5%".
pub fn format_score(score: f64) -> String {
    format!("{score:.1}%")
}

/// "October 19, 2026" for an RFC 3339 timestamp or a plain date.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return "N/A".to_string();
    };
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(e) => {
            tracing::debug!("Unparsable date '{}': {}", raw, e);
            "N/A".to_string()
        }
    }
}

use chrono::Duration;

/// Human readable duration, e.g. "2 hours 30 minutes".
///
/// Seconds are only shown when the duration is shorter than a minute.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }
    if seconds > 0 && hours == 0 && minutes == 0 {
        parts.push(plural(seconds, "second"));
    }

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(" ")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Format an amount held in minor units (cents) for display.
///
/// JPY has no minor unit in practice, so the amount is rounded to whole yen
/// and grouped with thousands separators.
pub fn format_currency(amount_cents: i64, currency: &str) -> String {
    let symbol = match currency {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        other => format!("{} ", other),
    };

    let sign = if amount_cents < 0 { "-" } else { "" };
    let abs = amount_cents.unsigned_abs();

    if currency == "JPY" {
        let whole = (abs + 50) / 100;
        return format!("{}{}{}", sign, symbol, group_thousands(whole));
    }

    format!("{}{}{}.{:02}", sign, symbol, abs / 100, abs % 100)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

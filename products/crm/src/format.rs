//! Display strings for board captions and dashboard cards.

/// US-dollar amount with thousands separators and no trailing zero cents:
/// `$1,200`, `$1,200.5`, `$1,200.05`.
pub fn format_usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = group_thousands(abs / 100);
    match abs % 100 {
        0 => format!("{sign}${dollars}"),
        fraction if fraction % 10 == 0 => format!("{sign}${dollars}.{}", fraction / 10),
        fraction => format!("{sign}${dollars}.{fraction:02}"),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Column header summary, e.g. `2 deals • $1,700`.
pub fn column_caption(count: usize, value_cents: i64) -> String {
    format!("{count} deals • {}", format_usd(value_cents))
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

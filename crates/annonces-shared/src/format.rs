/// Short price label: `85.0M FCFA`, `250K FCFA`, `950 FCFA`.
pub fn format_price(price: f64, currency: &str) -> String {
    if price >= 1_000_000.0 {
        format!("{:.1}M {currency}", price / 1_000_000.0)
    } else if price >= 1_000.0 {
        format!("{:.0}K {currency}", price / 1_000.0)
    } else {
        format!("{} {currency}", format_thousands(price))
    }
}

/// Integer part grouped by thousands with spaces: `12500000.0` -> `12 500 000`.
pub fn format_thousands(value: f64) -> String {
    let n = value.trunc() as i64;
    let digits = n.unsigned_abs().to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// `part / whole * 100`, rounded to one decimal; 0 when `whole` is 0.
pub fn rate_percent(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// `total / count`, rounded to one decimal; 0 when `count` is 0.
pub fn average(total: i64, count: i64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round1(total as f64 / count as f64)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

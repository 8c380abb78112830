//! pt-BR number formatting: `.` groups thousands, `,` separates decimals.

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `value` with a fixed number of decimals, e.g. `1.234,50`.
pub fn decimal(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    // Avoid "-0" after rounding.
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// Rounded whole number, e.g. `12.345`.
pub fn number(value: f64) -> String {
    decimal(value, 0)
}

fn currency_with(value: f64, decimals: usize) -> String {
    let body = decimal(value.abs(), decimals);
    if value < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-R$ {body}")
    } else {
        format!("R$ {body}")
    }
}

/// `R$ 1.234,56`
pub fn currency(value: f64) -> String {
    currency_with(value, 2)
}

/// `R$ 1.235`, for headline figures.
pub fn currency_whole(value: f64) -> String {
    currency_with(value, 0)
}

/// `12,3%`
pub fn percent(value: f64, decimals: usize) -> String {
    format!("{}%", decimal(value, decimals))
}

use crate::domain::model::NOT_AVAILABLE;

/// `$` plus comma-grouped whole dollars, e.g. `$10,500,000`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}", sign, grouped)
}

pub fn currency_or_na(amount: Option<f64>) -> String {
    amount.map(format_currency).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn decimal_or_na(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

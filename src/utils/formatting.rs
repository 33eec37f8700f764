//! Display helpers for notification messages and logs.

/// Formats a USD price with precision appropriate to its magnitude
/// (sub-dollar assets need more decimals to be readable).
pub fn format_usd(value: f64) -> String {
    if value >= 1.0 {
        format!("${:.2}", value)
    } else {
        format!("${:.6}", value)
    }
}

/// Signed percentage with two decimals, e.g. `+4.00%`.
pub fn format_percentage(value: f64) -> String {
    format!("{:+.2}%", value)
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

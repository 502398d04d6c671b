use chrono::{DateTime, Local, TimeZone, Utc};

const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a network deadline (milliseconds since the network epoch) as local time.
pub fn format_deadline(deadline_ms: u64, epoch_adjustment_secs: i64) -> Option<String> {
    format_deadline_in(deadline_ms, epoch_adjustment_secs, &Local)
}

pub fn format_deadline_in<Tz>(deadline_ms: u64, epoch_adjustment_secs: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let millis = i64::try_from(deadline_ms)
        .ok()?
        .checked_add(epoch_adjustment_secs.checked_mul(1000)?)?;
    let utc: DateTime<Utc> = Utc.timestamp_millis_opt(millis).single()?;
    Some(utc.with_timezone(tz).format(DEADLINE_FORMAT).to_string())
}

/// Renders an absolute amount using the mosaic's divisibility, e.g. `1500000` at 6 -> `1.5`.
pub fn relative_amount(amount: u64, divisibility: u8) -> String {
    if divisibility == 0 {
        return amount.to_string();
    }
    let digits = format!("{:0>width$}", amount, width = divisibility as usize + 1);
    let (whole, fraction) = digits.split_at(digits.len() - divisibility as usize);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

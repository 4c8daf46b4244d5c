// SPDX-License-Identifier: GPL-3.0-or-later
// notestamp - Timestamp templates (yyyy, MM, dd, HH, mm, ss)

use chrono::{Datelike, Local, Timelike};

/// Format `time` with a template. Only the first occurrence of each token is
/// replaced, in the order yyyy, MM, dd, HH, mm, ss. Everything else is kept
/// as written.
pub fn format_date<T: Datelike + Timelike>(time: &T, template: &str) -> String {
    let tokens = [
        ("yyyy", format!("{:04}", time.year())),
        ("MM", format!("{:02}", time.month())),
        ("dd", format!("{:02}", time.day())),
        ("HH", format!("{:02}", time.hour())),
        ("mm", format!("{:02}", time.minute())),
        ("ss", format!("{:02}", time.second())),
    ];

    let mut out = template.to_string();
    for (token, value) in tokens.iter() {
        out = out.replacen(token, value, 1);
    }
    out
}

/// Current local wall-clock time formatted with `template`.
pub fn now(template: &str) -> String {
    format_date(&Local::now(), template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 29)
            .and_then(|d| d.and_hms_opt(14, 30, 52))
            .unwrap()
    }

    #[test]
    fn default_template() {
        assert_eq!(format_date(&sample(), "yyyy-MM-ddTHH:mm:ss"), "2024-12-29T14:30:52");
    }

    #[test]
    fn compact_template() {
        assert_eq!(format_date(&sample(), "yyyyMMddHHmmss"), "20241229143052");
    }

    #[test]
    fn pads_single_digits() {
        let t = NaiveDate::from_ymd_opt(2025, 3, 4)
            .and_then(|d| d.and_hms_opt(5, 6, 7))
            .unwrap();
        assert_eq!(format_date(&t, "dd/MM/yyyy HH.mm.ss"), "04/03/2025 05.06.07");
    }

    #[test]
    fn only_first_occurrence_replaced() {
        assert_eq!(format_date(&sample(), "yyyy yyyy"), "2024 yyyy");
    }

    #[test]
    fn literal_text_kept() {
        assert_eq!(format_date(&sample(), "stamp"), "stamp");
        assert_eq!(format_date(&sample(), ""), "");
    }
}

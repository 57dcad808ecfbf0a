//! CSV rendering of history rows.

use super::HistoryRow;
use std::borrow::Cow;

const HEADER: [&str; 7] = [
    "timestamp",
    "student_id",
    "attendance_trend",
    "assignment_delay_avg",
    "marks_std",
    "engagement_score",
    "risk_level",
];

/// Header plus one line per row, `\n` terminated.
pub fn render_csv(rows: &[HistoryRow]) -> String {
    let mut out = String::new();
    write_record(&mut out, HEADER.iter().copied());
    for row in rows {
        let fields = [
            row.timestamp.clone(),
            row.student_id.clone(),
            num(row.features.attendance_trend),
            num(row.features.assignment_delay_avg),
            num(row.features.marks_std),
            num(row.features.engagement_score),
            row.risk_level.to_string(),
        ];
        write_record(&mut out, fields.iter().map(String::as_str));
    }
    out
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push('\n');
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Floats always carry a decimal point (`-7.0`, not `-7`).
fn num(v: f64) -> String {
    format!("{:?}", v)
}

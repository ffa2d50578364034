use chrono::{Datelike, Duration};
use serde::Serialize;

use super::Granularity;
use crate::date_key::{days_in_month, month_start, week_start, year_start, DateKey};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The date range a report covers. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub granularity: Granularity,
    pub start: DateKey,
    pub end: DateKey,
}

impl ReportWindow {
    /// The current week, month or year up to and including `today`.
    pub fn ending_on(granularity: Granularity, today: DateKey) -> Self {
        let date = today.date();
        let start = match granularity {
            Granularity::Week => week_start(date),
            Granularity::Month => month_start(date),
            Granularity::Year => year_start(date),
        };

        Self {
            granularity,
            start: DateKey::new(start),
            end: today,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        labels(self.granularity, self.end)
    }
}

/// Bucket labels for the period containing `end`: short weekday names from
/// Monday, day numbers of the month, or month abbreviations.
pub(super) fn labels(granularity: Granularity, end: DateKey) -> Vec<String> {
    let end = end.date();
    match granularity {
        Granularity::Week => {
            let monday = week_start(end);
            (0..7)
                .map(|i| (monday + Duration::days(i)).format("%a").to_string())
                .collect()
        }
        Granularity::Month => (1..=days_in_month(end.year(), end.month()))
            .map(|day| day.to_string())
            .collect(),
        Granularity::Year => MONTH_LABELS.iter().map(|m| m.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(y: i32, m: u32, d: u32) -> DateKey {
        DateKey::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_week_window_starts_monday() {
        // Thursday
        let window = ReportWindow::ending_on(Granularity::Week, key(2024, 3, 7));
        assert_eq!(window.start, key(2024, 3, 4));
        assert_eq!(window.end, key(2024, 3, 7));
    }

    #[test]
    fn test_sunday_belongs_to_previous_monday() {
        let window = ReportWindow::ending_on(Granularity::Week, key(2024, 3, 10));
        assert_eq!(window.start, key(2024, 3, 4));
        assert_eq!(
            window.labels(),
            vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
        );
    }

    #[test]
    fn test_month_and_year_windows() {
        let month = ReportWindow::ending_on(Granularity::Month, key(2024, 2, 17));
        assert_eq!(month.start, key(2024, 2, 1));
        assert_eq!(month.labels().len(), 29);
        assert_eq!(month.labels()[0], "1");
        assert_eq!(month.labels()[28], "29");

        let year = ReportWindow::ending_on(Granularity::Year, key(2024, 6, 30));
        assert_eq!(year.start, key(2024, 1, 1));
        assert_eq!(year.labels().len(), 12);
        assert_eq!(year.labels()[0], "Jan");
        assert_eq!(year.labels()[11], "Dec");
    }
}

//! Bucketing of meal and weight records into fixed-length series.

use chrono::Datelike;
use serde::Serialize;

use super::window::labels;
use super::Granularity;
use crate::date_key::{week_start, DateKey};
use crate::models::{Macros, MealRecord, WeightRecord};

/// Chart-ready series for one reporting window.
///
/// `labels`, `calories` and `macros` always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsBucketSet {
    pub granularity: Granularity,
    pub labels: Vec<String>,
    pub calories: Vec<f64>,
    pub macros: Vec<Macros>,
    pub weight: WeightSeries,
    /// Total calories divided by the number of buckets, rounded. Empty
    /// buckets count, so sparse logging lowers the average.
    pub average_calories: f64,
}

/// Weight data for a window.
///
/// Only the monthly view aligns weights to buckets; the weekly and yearly
/// views list the raw samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum WeightSeries {
    /// One slot per day of the month. A day without a sample carries the
    /// last known weight forward; days before the first sample are `None`.
    Daily(Vec<Option<f64>>),
    /// Valid samples within the window, in date order.
    Samples(Vec<WeightRecord>),
}

impl WeightSeries {
    pub fn is_empty(&self) -> bool {
        match self {
            WeightSeries::Daily(slots) => slots.iter().all(Option::is_none),
            WeightSeries::Samples(samples) => samples.is_empty(),
        }
    }
}

/// Buckets `meals` and `weights` dated within `[start, end]`.
///
/// Buckets follow the period that contains `end`. Records that fall inside
/// the window but outside that period, and records with non-finite
/// calories, are dropped. Non-finite macros are ignored while the record's
/// calories still count.
pub fn aggregate(
    meals: &[MealRecord],
    weights: &[WeightRecord],
    start: DateKey,
    end: DateKey,
    granularity: Granularity,
) -> StatsBucketSet {
    let labels = labels(granularity, end);
    let len = labels.len();

    let mut calories = vec![0.0; len];
    let mut macros = vec![Macros::default(); len];

    let in_window = |date: DateKey| date >= start && date <= end;

    for meal in meals.iter().filter(|meal| in_window(meal.date)) {
        if !meal.calories.is_finite() {
            tracing::warn!("Dropping '{}' on {}: non-finite calories", meal.name, meal.date);
            continue;
        }
        let Some(index) = bucket_index(granularity, end, meal.date).filter(|i| *i < len) else {
            continue;
        };

        calories[index] += meal.calories;
        if let Some(meal_macros) = meal.macros.filter(Macros::is_finite) {
            macros[index] += meal_macros;
        }
    }

    let average_calories = if len == 0 {
        0.0
    } else {
        (calories.iter().sum::<f64>() / len as f64).round()
    };

    let mut samples: Vec<WeightRecord> = weights
        .iter()
        .filter(|record| record.is_valid() && in_window(record.date))
        .copied()
        .collect();
    // Stable, so entries sharing a date keep their stored order
    samples.sort_by_key(|record| record.date);

    let weight = match granularity {
        Granularity::Month => WeightSeries::Daily(daily_weights(&samples, end, len)),
        Granularity::Week | Granularity::Year => WeightSeries::Samples(samples),
    };

    StatsBucketSet {
        granularity,
        labels,
        calories,
        macros,
        weight,
        average_calories,
    }
}

/// Bucket of `date` relative to the period containing `end`, or `None` if
/// it lies in another period.
fn bucket_index(granularity: Granularity, end: DateKey, date: DateKey) -> Option<usize> {
    let end = end.date();
    let date = date.date();

    match granularity {
        Granularity::Week => usize::try_from((date - week_start(end)).num_days()).ok(),
        Granularity::Month => {
            (date.year() == end.year() && date.month() == end.month()).then(|| date.day0() as usize)
        }
        Granularity::Year => (date.year() == end.year()).then(|| date.month0() as usize),
    }
}

fn daily_weights(samples: &[WeightRecord], end: DateKey, len: usize) -> Vec<Option<f64>> {
    let mut slots = vec![None; len];

    for sample in samples {
        if let Some(index) = bucket_index(Granularity::Month, end, sample.date).filter(|i| *i < len) {
            // Later samples for the same day win
            slots[index] = Some(sample.weight);
        }
    }

    let mut last_known = None;
    for slot in &mut slots {
        match slot {
            Some(weight) => last_known = Some(*weight),
            None => *slot = last_known,
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Section;

    fn key(y: i32, m: u32, d: u32) -> DateKey {
        DateKey::from_ymd(y, m, d).unwrap()
    }

    fn meal(date: DateKey, calories: f64) -> MealRecord {
        MealRecord::new("meal", calories, date, Section::Lunch)
    }

    #[test]
    fn test_weekly_buckets_from_monday() {
        let meals: Vec<MealRecord> = (4..=10).map(|d| meal(key(2024, 3, d), 500.0)).collect();

        let stats = aggregate(&meals, &[], key(2024, 3, 4), key(2024, 3, 10), Granularity::Week);

        assert_eq!(stats.calories, vec![500.0; 7]);
        assert_eq!(stats.labels[0], "Mon");
        assert_eq!(stats.labels.len(), stats.macros.len());
        assert_eq!(stats.average_calories, 500.0);
    }

    #[test]
    fn test_sunday_end_is_last_bucket() {
        let meals = vec![meal(key(2024, 3, 10), 300.0)];
        let stats = aggregate(&meals, &[], key(2024, 3, 4), key(2024, 3, 10), Granularity::Week);
        assert_eq!(stats.calories[6], 300.0);
    }

    #[test]
    fn test_average_counts_empty_buckets() {
        let meals = vec![meal(key(2024, 3, 6), 1400.0)];
        let stats = aggregate(&meals, &[], key(2024, 3, 4), key(2024, 3, 10), Granularity::Week);
        assert_eq!(stats.average_calories, 200.0);
    }

    #[test]
    fn test_out_of_window_records_are_dropped() {
        let meals = vec![
            meal(key(2024, 3, 6), 700.0),
            meal(key(2024, 3, 11), 5000.0),
            meal(key(2024, 3, 3), 5000.0),
        ];
        let stats = aggregate(&meals, &[], key(2024, 3, 4), key(2024, 3, 10), Granularity::Week);

        assert_eq!(stats.calories.iter().sum::<f64>(), 700.0);
        assert_eq!(stats.average_calories, 100.0);
    }

    #[test]
    fn test_window_start_before_period_is_dropped() {
        // A window reaching into February still buckets March only
        let meals = vec![meal(key(2024, 2, 28), 400.0), meal(key(2024, 3, 2), 600.0)];
        let stats = aggregate(&meals, &[], key(2024, 2, 20), key(2024, 3, 15), Granularity::Month);

        assert_eq!(stats.labels.len(), 31);
        assert_eq!(stats.calories[1], 600.0);
        assert_eq!(stats.calories.iter().sum::<f64>(), 600.0);
    }

    #[test]
    fn test_macros_are_summed_and_non_finite_filtered() {
        let day = key(2024, 3, 5);
        let meals = vec![
            meal(day, 200.0).with_macros(Macros::new(10.0, 20.0, 5.0)),
            meal(day, 300.0).with_macros(Macros::new(15.0, 30.0, 10.0)),
            meal(day, 100.0).with_macros(Macros::new(f64::NAN, 1.0, 1.0)),
            meal(day, f64::INFINITY),
            meal(day, 50.0),
        ];
        let stats = aggregate(&meals, &[], key(2024, 3, 4), key(2024, 3, 10), Granularity::Week);

        assert_eq!(stats.calories[1], 650.0);
        assert_eq!(stats.macros[1], Macros::new(25.0, 50.0, 15.0));
        assert_eq!(stats.macros[0], Macros::default());
    }

    #[test]
    fn test_yearly_buckets_by_month() {
        let meals = vec![
            meal(key(2024, 1, 15), 100.0),
            meal(key(2024, 1, 20), 200.0),
            meal(key(2024, 6, 1), 50.0),
        ];
        let stats = aggregate(&meals, &[], key(2024, 1, 1), key(2024, 6, 30), Granularity::Year);

        assert_eq!(stats.labels[0], "Jan");
        assert_eq!(stats.calories[0], 300.0);
        assert_eq!(stats.calories[5], 50.0);
        assert_eq!(stats.calories.len(), 12);
        assert_eq!(stats.average_calories, 29.0);
    }

    #[test]
    fn test_monthly_weight_carries_forward() {
        let weights = vec![
            WeightRecord::new(key(2024, 4, 15), 68.0),
            WeightRecord::new(key(2024, 4, 1), 70.0),
        ];
        let stats = aggregate(&[], &weights, key(2024, 4, 1), key(2024, 4, 30), Granularity::Month);

        let WeightSeries::Daily(slots) = stats.weight else {
            panic!("monthly stats should have daily weights");
        };
        assert_eq!(slots.len(), 30);
        assert!(slots[..14].iter().all(|w| *w == Some(70.0)));
        assert!(slots[14..].iter().all(|w| *w == Some(68.0)));
    }

    #[test]
    fn test_monthly_weight_unknown_leading_days() {
        let weights = vec![
            WeightRecord::new(key(2024, 4, 10), 71.0),
            WeightRecord::new(key(2024, 4, 10), 70.5),
            WeightRecord::new(key(2024, 4, 12), f64::NAN),
        ];
        let stats = aggregate(&[], &weights, key(2024, 4, 1), key(2024, 4, 30), Granularity::Month);

        let WeightSeries::Daily(slots) = stats.weight else {
            panic!("monthly stats should have daily weights");
        };
        assert!(slots[..9].iter().all(Option::is_none));
        assert_eq!(slots[9], Some(70.5));
        assert_eq!(slots[11], Some(70.5));
        assert_eq!(slots[29], Some(70.5));
    }

    #[test]
    fn test_other_modes_list_samples_in_date_order() {
        let weights = vec![
            WeightRecord::new(key(2024, 3, 8), 69.0),
            WeightRecord::new(key(2024, 3, 5), 70.0),
            WeightRecord::new(key(2024, 3, 12), 68.0),
            WeightRecord::new(key(2024, 3, 6), -2.0),
        ];
        let stats = aggregate(&[], &weights, key(2024, 3, 4), key(2024, 3, 10), Granularity::Week);

        assert_eq!(
            stats.weight,
            WeightSeries::Samples(vec![
                WeightRecord::new(key(2024, 3, 5), 70.0),
                WeightRecord::new(key(2024, 3, 8), 69.0),
            ])
        );
    }

    #[test]
    fn test_empty_input() {
        let stats = aggregate(&[], &[], key(2024, 2, 1), key(2024, 2, 10), Granularity::Month);
        assert_eq!(stats.calories, vec![0.0; 29]);
        assert_eq!(stats.average_calories, 0.0);
        assert!(stats.weight.is_empty());
    }
}

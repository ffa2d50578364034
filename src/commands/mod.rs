mod config_cmd;
mod meal;
mod plan;
mod profile;
mod stats;
mod weight;

use chrono::Duration;
use clap::{Args, ValueEnum};
use fueltrack_core::{DateKey, Macros, MealRecord, Section};

pub use config_cmd::ConfigCommand;
pub use meal::MealCommand;
pub use plan::PlanCommand;
pub use profile::ProfileCommand;
pub use stats::StatsCommand;
pub use weight::WeightCommand;

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A food item as typed on the command line.
#[derive(Args)]
pub struct FoodArgs {
    /// Food name
    pub name: String,

    /// Calories (kcal)
    #[arg(long)]
    pub calories: f64,

    /// Number of servings
    #[arg(long, default_value_t = 1.0)]
    pub servings: f64,

    /// Protein (g)
    #[arg(long)]
    pub protein: Option<f64>,

    /// Carbohydrates (g)
    #[arg(long)]
    pub carbs: Option<f64>,

    /// Fats (g)
    #[arg(long)]
    pub fats: Option<f64>,
}

impl FoodArgs {
    /// Macros are attached when at least one of them was given; the
    /// others count as zero.
    pub fn to_record(&self, date: DateKey, section: Section) -> MealRecord {
        let record = MealRecord::new(self.name.clone(), self.calories, date, section)
            .with_servings(self.servings);

        if self.protein.is_none() && self.carbs.is_none() && self.fats.is_none() {
            return record;
        }
        record.with_macros(Macros::new(
            self.protein.unwrap_or(0.0),
            self.carbs.unwrap_or(0.0),
            self.fats.unwrap_or(0.0),
        ))
    }
}

/// `date` or today.
fn date_or_today(date: Option<DateKey>) -> DateKey {
    date.unwrap_or_else(DateKey::today)
}

/// Inclusive range for history listings: `to` defaults to today and `from`
/// to a week before `to`.
fn history_range(from: Option<DateKey>, to: Option<DateKey>) -> Result<(DateKey, DateKey), String> {
    let to = date_or_today(to);
    let from = from.unwrap_or_else(|| DateKey::new(to.date() - Duration::days(6)));
    if from > to {
        return Err(format!("--from {} is after --to {}", from, to));
    }
    Ok((from, to))
}

/// Config for command tests; the store is injected separately.
#[cfg(test)]
fn test_config() -> crate::config::Config {
    use crate::config::{Config, ConfigSource, ConfigValue};

    Config {
        data_dir: ConfigValue::new(std::path::PathBuf::from("/unused"), ConfigSource::Default),
        user: ConfigValue::new("u1".to_string(), ConfigSource::Default),
        log_level: ConfigValue::new("warn".to_string(), ConfigSource::Default),
        goals: ConfigValue::new(fueltrack_core::DailyGoals::default(), ConfigSource::Default),
        config_file: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(d: u32) -> DateKey {
        DateKey::from_ymd(2024, 3, d).unwrap()
    }

    fn food(protein: Option<f64>) -> FoodArgs {
        FoodArgs {
            name: "Oats".to_string(),
            calories: 300.0,
            servings: 1.0,
            protein,
            carbs: None,
            fats: None,
        }
    }

    #[test]
    fn test_food_without_macros() {
        let record = food(None).to_record(key(4), Section::Breakfast);
        assert_eq!(record.macros, None);
        assert_eq!(record.section, Section::Breakfast);
    }

    #[test]
    fn test_food_with_partial_macros() {
        let record = food(Some(12.0)).to_record(key(4), Section::Breakfast);
        assert_eq!(record.macros, Some(Macros::new(12.0, 0.0, 0.0)));
    }

    #[test]
    fn test_history_range_defaults_to_a_week() {
        let (from, to) = history_range(None, Some(key(10))).unwrap();
        assert_eq!(from, key(4));
        assert_eq!(to, key(10));
    }

    #[test]
    fn test_history_range_rejects_reversed_dates() {
        let err = history_range(Some(key(12)), Some(key(10))).unwrap_err();
        assert!(err.contains("after"));
    }
}

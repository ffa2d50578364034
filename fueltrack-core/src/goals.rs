//! Daily targets and the summary shown against them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{DayPlan, Macros, UserProfile};

/// Daily calorie and macro targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyGoals {
    /// kcal
    pub calories: f64,
    /// Grams.
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein: 150.0,
            carbs: 250.0,
            fats: 70.0,
        }
    }
}

impl DailyGoals {
    /// Uses the profile's calorie goal when it has one.
    pub fn with_profile(mut self, profile: &UserProfile) -> Self {
        if let Some(goal) = profile.cal_intake_goal.filter(|goal| *goal > 0) {
            self.calories = f64::from(goal);
        }
        self
    }
}

/// One day's intake measured against [`DailyGoals`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub consumed: f64,
    /// Always 0 until activity tracking exists.
    pub burned: f64,
    pub net: f64,
    /// Calories left before the goal. Never negative.
    pub remaining: f64,
    pub macros: Macros,
    pub goals: DailyGoals,
}

impl DailySummary {
    pub fn new(day: &DayPlan, goals: &DailyGoals) -> Self {
        let consumed = day.total_calories();
        let burned = 0.0;
        let net = consumed - burned;

        Self {
            consumed,
            burned,
            net,
            remaining: (goals.calories - net).max(0.0),
            macros: day.total_macros(),
            goals: *goals,
        }
    }

    /// Net calories as a fraction of the goal, clamped to `[0, 1]`.
    pub fn calorie_progress(&self) -> f64 {
        progress(self.net, self.goals.calories)
    }

    /// Protein, carbs and fats progress, each clamped to `[0, 1]`.
    pub fn macro_progress(&self) -> Macros {
        Macros::new(
            progress(self.macros.protein, self.goals.protein),
            progress(self.macros.carbs, self.goals.carbs),
            progress(self.macros.fats, self.goals.fats),
        )
    }
}

fn progress(value: f64, goal: f64) -> f64 {
    if goal <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / goal).clamp(0.0, 1.0)
}

impl fmt::Display for DailySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Consumed: {} / {} kcal ({:.0}%)",
            self.consumed,
            self.goals.calories,
            self.calorie_progress() * 100.0
        )?;
        writeln!(f, "Burned: {} kcal", self.burned)?;
        writeln!(f, "Net: {} kcal", self.net)?;
        writeln!(f, "Remaining: {} kcal", self.remaining)?;
        write!(
            f,
            "Protein: {}/{}g  Carbs: {}/{}g  Fats: {}/{}g",
            self.macros.protein,
            self.goals.protein,
            self.macros.carbs,
            self.goals.carbs,
            self.macros.fats,
            self.goals.fats
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_key::DateKey;
    use crate::models::{MealRecord, Section};

    fn day_with(calories: &[f64]) -> DayPlan {
        let date = DateKey::from_ymd(2024, 3, 4).unwrap();
        let mut plan = DayPlan::new();
        for (i, kcal) in calories.iter().enumerate() {
            plan.lunch.push(
                MealRecord::new(format!("m{i}"), *kcal, date, Section::Lunch)
                    .with_macros(Macros::new(50.0, 100.0, 30.0)),
            );
        }
        plan
    }

    #[test]
    fn test_default_goals() {
        let goals = DailyGoals::default();
        assert_eq!(goals.calories, 2000.0);
        assert_eq!(goals.protein, 150.0);
        assert_eq!(goals.carbs, 250.0);
        assert_eq!(goals.fats, 70.0);
    }

    #[test]
    fn test_profile_overrides_calories() {
        let profile = UserProfile {
            cal_intake_goal: Some(1800),
            ..Default::default()
        };
        assert_eq!(DailyGoals::default().with_profile(&profile).calories, 1800.0);
        assert_eq!(
            DailyGoals::default()
                .with_profile(&UserProfile::default())
                .calories,
            2000.0
        );
    }

    #[test]
    fn test_summary_under_goal() {
        let summary = DailySummary::new(&day_with(&[500.0, 300.0]), &DailyGoals::default());
        assert_eq!(summary.consumed, 800.0);
        assert_eq!(summary.burned, 0.0);
        assert_eq!(summary.net, 800.0);
        assert_eq!(summary.remaining, 1200.0);
        assert_eq!(summary.macros, Macros::new(100.0, 200.0, 60.0));
        assert!((summary.calorie_progress() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_summary_over_goal_clamps() {
        let summary = DailySummary::new(&day_with(&[1500.0, 900.0]), &DailyGoals::default());
        assert_eq!(summary.remaining, 0.0);
        assert_eq!(summary.calorie_progress(), 1.0);
        let progress = summary.macro_progress();
        assert!((progress.protein - 100.0 / 150.0).abs() < 1e-9);

        let summary = DailySummary::new(&day_with(&[100.0, 100.0, 100.0]), &DailyGoals::default());
        assert_eq!(summary.macro_progress().fats, 1.0);
    }

    #[test]
    fn test_partial_goals_keep_defaults() {
        let goals: DailyGoals = serde_json::from_str(r#"{ "calories": 1600 }"#).unwrap();
        assert_eq!(goals.calories, 1600.0);
        assert_eq!(goals.protein, 150.0);
    }
}

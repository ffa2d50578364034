use serde::{Deserialize, Serialize};
use std::fmt;

use super::macros::Macros;
use super::meal::MealRecord;
use super::section::Section;

/// The meals of one calendar day, split into the four sections.
///
/// Every section is always present; insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(rename = "Breakfast", default)]
    pub breakfast: Vec<MealRecord>,
    #[serde(rename = "Lunch", default)]
    pub lunch: Vec<MealRecord>,
    #[serde(rename = "Dinner", default)]
    pub dinner: Vec<MealRecord>,
    #[serde(rename = "Snacks", default)]
    pub snacks: Vec<MealRecord>,
}

impl DayPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, section: Section) -> &[MealRecord] {
        match section {
            Section::Breakfast => &self.breakfast,
            Section::Lunch => &self.lunch,
            Section::Dinner => &self.dinner,
            Section::Snacks => &self.snacks,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Vec<MealRecord> {
        match section {
            Section::Breakfast => &mut self.breakfast,
            Section::Lunch => &mut self.lunch,
            Section::Dinner => &mut self.dinner,
            Section::Snacks => &mut self.snacks,
        }
    }

    /// Every meal, in section order.
    pub fn all_meals(&self) -> impl Iterator<Item = &MealRecord> {
        Section::ALL
            .into_iter()
            .flat_map(move |section| self.section(section).iter())
    }

    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| self.section(*s).is_empty())
    }

    pub fn total_calories(&self) -> f64 {
        self.all_meals().map(|m| m.calories).sum()
    }

    /// Sum of the macros of every meal that has them.
    pub fn total_macros(&self) -> Macros {
        self.all_meals().filter_map(|m| m.macros).sum()
    }
}

impl fmt::Display for DayPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in Section::ALL {
            let meals = self.section(section);
            writeln!(f, "{}:", section)?;
            if meals.is_empty() {
                writeln!(f, "  (nothing planned)")?;
            }
            for (i, meal) in meals.iter().enumerate() {
                writeln!(f, "  [{}] {}", i, meal)?;
            }
        }
        write!(f, "Total: {} kcal", self.total_calories())
    }
}

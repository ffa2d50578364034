use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Protein, carbohydrate and fat content in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl Macros {
    pub fn new(protein: f64, carbs: f64, fats: f64) -> Self {
        Self {
            protein,
            carbs,
            fats,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.protein.is_finite() && self.carbs.is_finite() && self.fats.is_finite()
    }

    /// Named channels, in chart order.
    pub fn channels(&self) -> [(&'static str, f64); 3] {
        [
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
        ]
    }
}

impl Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Macros) -> Macros {
        Macros {
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fats: self.fats + rhs.fats,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Macros) {
        *self = *self + rhs;
    }
}

impl Sum for Macros {
    fn sum<I: Iterator<Item = Macros>>(iter: I) -> Self {
        iter.fold(Macros::default(), Add::add)
    }
}

impl fmt::Display for Macros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P {}g / C {}g / F {}g",
            self.protein, self.carbs, self.fats
        )
    }
}

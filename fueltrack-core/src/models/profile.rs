use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::weight::WeightRecord;
use crate::error::ValidationError;

/// What the user is working towards, chosen during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Build,
    Lose,
    Maintain,
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Build => write!(f, "build"),
            Goal::Lose => write!(f, "lose"),
            Goal::Maintain => write!(f, "maintain"),
        }
    }
}

impl FromStr for Goal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "build" => Ok(Goal::Build),
            "lose" => Ok(Goal::Lose),
            "maintain" => Ok(Goal::Maintain),
            _ => Err(ValidationError::InvalidGoal(s.to_string())),
        }
    }
}

/// The `users/{uid}` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Centimetres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Kilograms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_weight: Option<f64>,
    /// Daily calorie target in kcal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cal_intake_goal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weight_history: Vec<WeightRecord>,
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_dash<T: fmt::Display>(value: &Option<T>, unit: &str) -> String {
            match value {
                Some(v) => format!("{}{}", v, unit),
                None => "-".to_string(),
            }
        }

        writeln!(f, "Name: {}", self.name.as_deref().unwrap_or("User"))?;
        writeln!(f, "Email: {}", self.email.as_deref().unwrap_or("-"))?;
        writeln!(f, "Age: {}", or_dash(&self.age, ""))?;
        writeln!(f, "Height: {}", or_dash(&self.height, " cm"))?;
        writeln!(f, "Weight: {}", or_dash(&self.weight, " kg"))?;
        writeln!(f, "Goal: {}", or_dash(&self.goal, ""))?;
        writeln!(f, "Calorie goal: {}", or_dash(&self.cal_intake_goal, " kcal"))?;
        write!(f, "Goal weight: {}", or_dash(&self.goal_weight, " kg"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_key::DateKey;

    #[test]
    fn test_goal_from_str() {
        assert_eq!(Goal::from_str("Lose").unwrap(), Goal::Lose);
        assert!(matches!(
            Goal::from_str("bulk"),
            Err(ValidationError::InvalidGoal(_))
        ));
    }

    #[test]
    fn test_profile_uses_camel_case_fields() {
        let profile = UserProfile {
            goal_weight: Some(65.0),
            cal_intake_goal: Some(1800),
            weight_history: vec![WeightRecord::new(
                DateKey::from_ymd(2025, 4, 28).unwrap(),
                70.0,
            )],
            ..Default::default()
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["goalWeight"], 65.0);
        assert_eq!(json["calIntakeGoal"], 1800);
        assert_eq!(json["weightHistory"][0]["date"], "2025-04-28");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_profile_display_uses_dashes() {
        let profile = UserProfile {
            name: Some("Sam".to_string()),
            weight: Some(72.5),
            ..Default::default()
        };
        let output = format!("{}", profile);
        assert!(output.contains("Name: Sam"));
        assert!(output.contains("Weight: 72.5 kg"));
        assert!(output.contains("Goal: -"));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// The four fixed parts of a day's meals.
///
/// The serialized names double as field names in remote meal plan documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl Section {
    /// All sections in display order.
    pub const ALL: [Section; 4] = [
        Section::Breakfast,
        Section::Lunch,
        Section::Dinner,
        Section::Snacks,
    ];

    /// Field name used in remote documents.
    pub fn field_name(&self) -> &'static str {
        match self {
            Section::Breakfast => "Breakfast",
            Section::Lunch => "Lunch",
            Section::Dinner => "Dinner",
            Section::Snacks => "Snacks",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Section::Breakfast => 0,
            Section::Lunch => 1,
            Section::Dinner => 2,
            Section::Snacks => 3,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for Section {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(Section::Breakfast),
            "lunch" => Ok(Section::Lunch),
            "dinner" => Ok(Section::Dinner),
            "snacks" | "snack" => Ok(Section::Snacks),
            _ => Err(ValidationError::InvalidSection(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_display() {
        assert_eq!(format!("{}", Section::Breakfast), "Breakfast");
        assert_eq!(format!("{}", Section::Snacks), "Snacks");
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!(Section::from_str("breakfast").unwrap(), Section::Breakfast);
        assert_eq!(Section::from_str("LUNCH").unwrap(), Section::Lunch);
        assert_eq!(Section::from_str("Dinner").unwrap(), Section::Dinner);
        assert_eq!(Section::from_str("snack").unwrap(), Section::Snacks);
        assert_eq!(Section::from_str("Snacks").unwrap(), Section::Snacks);
    }

    #[test]
    fn test_section_from_str_invalid() {
        assert!(matches!(
            Section::from_str("brunch"),
            Err(ValidationError::InvalidSection(_))
        ));
        assert!(Section::from_str("").is_err());
    }

    #[test]
    fn test_section_json_uses_field_name() {
        let json = serde_json::to_string(&Section::Lunch).unwrap();
        assert_eq!(json, "\"Lunch\"");

        let parsed: Section = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Section::Lunch);
    }

    #[test]
    fn test_index_matches_display_order() {
        for (i, section) in Section::ALL.iter().enumerate() {
            assert_eq!(section.index(), i);
        }
    }
}

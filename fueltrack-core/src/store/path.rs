//! Slash-separated document and collection paths.
//!
//! ```text
//! users/{uid}                       profile document
//! users/{uid}/meals                 meal journal collection
//! users/{uid}/meals/{mealId}        one logged meal
//! users/{uid}/mealPlans/{dateKey}   one day's plan, one array field per section
//! ```

use std::fmt;

use super::StoreError;
use crate::date_key::DateKey;

const USERS: &str = "users";
const MEALS: &str = "meals";
const MEAL_PLANS: &str = "mealPlans";

/// A validated path. An even number of segments names a document, an odd
/// number names a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        for segment in &segments {
            validate_segment(path, segment)?;
        }
        Ok(Self { segments })
    }

    /// Appends one segment.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        validate_segment(segment, segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// The collection containing this document, or the document owning this
    /// collection.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment: the document id for documents.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_document(&self) -> bool {
        self.segments.len() % 2 == 0
    }

    pub fn is_collection(&self) -> bool {
        !self.is_document()
    }

    pub fn expect_document(&self) -> Result<(), StoreError> {
        if self.is_document() {
            Ok(())
        } else {
            Err(StoreError::invalid_path(self.to_string(), "expected a document path"))
        }
    }

    pub fn expect_collection(&self) -> Result<(), StoreError> {
        if self.is_collection() {
            Ok(())
        } else {
            Err(StoreError::invalid_path(self.to_string(), "expected a collection path"))
        }
    }

    /// `users/{uid}`
    pub fn user(uid: &str) -> Result<Self, StoreError> {
        Self::parse(USERS)?.child(uid)
    }

    /// `users/{uid}/meals`
    pub fn meals(uid: &str) -> Result<Self, StoreError> {
        Self::user(uid)?.child(MEALS)
    }

    /// `users/{uid}/meals/{meal_id}`
    pub fn meal(uid: &str, meal_id: &str) -> Result<Self, StoreError> {
        Self::meals(uid)?.child(meal_id)
    }

    /// `users/{uid}/mealPlans/{date}`
    pub fn meal_plan(uid: &str, date: &DateKey) -> Result<Self, StoreError> {
        Self::user(uid)?
            .child(MEAL_PLANS)?
            .child(&date.to_string())
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Rejects segments that would escape the store root on disk.
fn validate_segment(path: &str, segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() {
        return Err(StoreError::invalid_path(path, "empty segment"));
    }
    if segment.starts_with('.') {
        return Err(StoreError::invalid_path(path, "segment starts with '.'"));
    }
    if segment.contains('\\') || segment.contains('/') {
        return Err(StoreError::invalid_path(path, "segment contains a separator"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_shapes() {
        let date = DateKey::from_ymd(2024, 3, 4).unwrap();

        assert_eq!(DocPath::user("u1").unwrap().to_string(), "users/u1");
        assert_eq!(DocPath::meals("u1").unwrap().to_string(), "users/u1/meals");
        assert_eq!(
            DocPath::meal("u1", "abc").unwrap().to_string(),
            "users/u1/meals/abc"
        );
        assert_eq!(
            DocPath::meal_plan("u1", &date).unwrap().to_string(),
            "users/u1/mealPlans/2024-03-04"
        );
    }

    #[test]
    fn test_document_vs_collection() {
        assert!(DocPath::user("u1").unwrap().is_document());
        assert!(DocPath::meals("u1").unwrap().is_collection());
        assert!(DocPath::meals("u1").unwrap().expect_document().is_err());
        assert!(DocPath::user("u1").unwrap().expect_collection().is_err());
    }

    #[test]
    fn test_parent_and_id() {
        let path = DocPath::meal("u1", "m1").unwrap();
        assert_eq!(path.id(), "m1");
        assert_eq!(path.parent().unwrap(), DocPath::meals("u1").unwrap());
        assert!(DocPath::parse("users").unwrap().parent().is_none());
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(DocPath::parse("users/../etc").is_err());
        assert!(DocPath::parse("users//x").is_err());
        assert!(DocPath::parse("users/.hidden").is_err());
        assert!(DocPath::user("a\\b").is_err());
        assert!(DocPath::user("a/b").is_err());
        assert!(DocPath::user("").is_err());
    }
}

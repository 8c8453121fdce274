//! Clip categories and the classification rule.
//!
//! The second underscore segment of a clip name is a single-letter code:
//! `L` (landed), `F` (failed) or `B` (b-roll). When landed and failed clips
//! are merged they are both treated as a-roll (`A`).
//!
//! # Examples
//!
//! ```
//! use clipsort::category::Category;
//!
//! assert_eq!(Category::classify("L", false).unwrap(), Category::Landed);
//! assert_eq!(Category::classify("F", true).unwrap(), Category::Aroll);
//! assert!(Category::classify("X", false).is_err());
//! ```

use crate::clip_name::FileError;

/// The canonical category of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Landed trick (`L`).
    Landed,
    /// Failed attempt (`F`).
    Failed,
    /// B-roll footage without a person (`B`).
    Broll,
    /// A-roll, landed and failed merged together (`A`).
    Aroll,
}

impl Category {
    /// Resolves a raw category code, applying the landed/failed merge rule.
    ///
    /// A literal `A` is not a valid input code; a-roll only comes out of a merge.
    pub fn classify(raw: &str, merge_landed_failed: bool) -> Result<Self, FileError> {
        match raw {
            "L" | "F" if merge_landed_failed => Ok(Category::Aroll),
            "L" => Ok(Category::Landed),
            "F" => Ok(Category::Failed),
            "B" => Ok(Category::Broll),
            other => Err(FileError::UnknownCategory(other.to_string())),
        }
    }

    /// Returns the code used both in file names and as the directory name.
    ///
    /// ```
    /// use clipsort::category::Category;
    ///
    /// assert_eq!(Category::Broll.code(), "B");
    /// assert_eq!(Category::Aroll.code(), "A");
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            Category::Landed => "L",
            Category::Failed => "F",
            Category::Broll => "B",
            Category::Aroll => "A",
        }
    }

    /// Whether clips of this category carry a person segment.
    pub fn has_person(&self) -> bool {
        !matches!(self, Category::Broll)
    }

    /// Minimum number of segments after the category code.
    pub(crate) fn required_fields(&self) -> usize {
        if self.has_person() { 3 } else { 2 }
    }

    /// Returns a human-readable description of this category.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Landed => "Landed",
            Category::Failed => "Failed",
            Category::Broll => "B-roll",
            Category::Aroll => "A-roll",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_without_merge_keeps_literal() {
        assert_eq!(Category::classify("L", false).unwrap(), Category::Landed);
        assert_eq!(Category::classify("F", false).unwrap(), Category::Failed);
        assert_eq!(Category::classify("B", false).unwrap(), Category::Broll);
    }

    #[test]
    fn test_classify_merge_landed_failed() {
        assert_eq!(Category::classify("L", true).unwrap(), Category::Aroll);
        assert_eq!(Category::classify("F", true).unwrap(), Category::Aroll);
    }

    #[test]
    fn test_classify_broll_unaffected_by_merge() {
        assert_eq!(Category::classify("B", true).unwrap(), Category::Broll);
        assert_eq!(Category::classify("B", false).unwrap(), Category::Broll);
    }

    #[test]
    fn test_classify_rejects_unknown_codes() {
        for raw in ["A", "l", "X", "", "LF"] {
            match Category::classify(raw, true) {
                Err(FileError::UnknownCategory(code)) => assert_eq!(code, raw),
                other => panic!("expected UnknownCategory for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_codes_and_person_rules() {
        assert_eq!(Category::Landed.code(), "L");
        assert_eq!(Category::Failed.code(), "F");
        assert_eq!(Category::Broll.code(), "B");
        assert_eq!(Category::Aroll.code(), "A");

        assert!(!Category::Broll.has_person());
        assert!(Category::Landed.has_person());
        assert!(Category::Failed.has_person());
        assert!(Category::Aroll.has_person());

        assert_eq!(Category::Broll.required_fields(), 2);
        assert_eq!(Category::Aroll.required_fields(), 3);
    }

    #[test]
    fn test_display_uses_code() {
        assert_eq!(Category::Aroll.to_string(), "A");
    }
}

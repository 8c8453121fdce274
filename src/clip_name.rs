//! Clip file name parsing and field extraction.
//!
//! Clip names follow the convention `DATE_CATEGORY_SPOT_PERSON_REST`, where
//! b-roll clips (`B`) have no `PERSON` segment:
//!
//! ```text
//! 20230115_L_PoolBlock_Jordan_clip1.mov
//! 20230115_B_PoolBlock_clip1.mov
//! ```

use crate::category::Category;
use crate::grouping::GroupingKey;
use std::path::PathBuf;

/// Minimum number of underscore-separated segments in any clip name.
const MIN_SEGMENTS: usize = 3;

/// Reasons a single file could not be sorted.
///
/// None of these abort a batch; they are recorded against the file name.
#[derive(Debug)]
pub enum FileError {
    /// The name has fewer than three underscore-separated segments.
    MalformedName { segments: usize },
    /// The category code is not one of `L`, `F` or `B`.
    UnknownCategory(String),
    /// Not enough segments after the category code for this category.
    InsufficientFields {
        category: Category,
        found: usize,
        required: usize,
    },
    /// A segment that would become a folder name is `.` or `..`.
    UnsafeSegment { key: GroupingKey, value: String },
    /// Creating the target directory or moving/copying the file failed.
    Filesystem {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedName { segments } => write!(
                f,
                "Not enough underscore parts (found {}, need at least {})",
                segments, MIN_SEGMENTS
            ),
            Self::UnknownCategory(raw) => write!(f, "Invalid category '{}'", raw),
            Self::InsufficientFields {
                category,
                found,
                required,
            } => write!(
                f,
                "Insufficient parts for {}: expected at least {} after the category, found {}",
                category, required, found
            ),
            Self::UnsafeSegment { key, value } => {
                write!(f, "Refusing to use '{}' as the {} folder", value, key)
            }
            Self::Filesystem {
                action,
                path,
                source,
            } => write!(f, "Failed to {} {}: {}", action, path.display(), source),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filesystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A clip name split into its leading segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Export date, kept as written.
    pub date: String,
    /// Category code before classification.
    pub raw_category: String,
    /// Everything after the category code.
    pub rest: Vec<String>,
}

impl ParsedName {
    /// Splits a bare file name (no directory components) on underscores.
    ///
    /// ```
    /// use clipsort::clip_name::ParsedName;
    ///
    /// let parsed = ParsedName::parse("20230115_B_PoolBlock_clip1.mov").unwrap();
    /// assert_eq!(parsed.date, "20230115");
    /// assert_eq!(parsed.raw_category, "B");
    /// assert_eq!(parsed.rest, vec!["PoolBlock", "clip1.mov"]);
    /// ```
    pub fn parse(file_name: &str) -> Result<Self, FileError> {
        let mut segments: Vec<String> = file_name.split('_').map(str::to_string).collect();
        if segments.len() < MIN_SEGMENTS {
            return Err(FileError::MalformedName {
                segments: segments.len(),
            });
        }

        let rest = segments.split_off(2);
        let raw_category = segments.pop().unwrap_or_default();
        let date = segments.pop().unwrap_or_default();
        Ok(Self {
            date,
            raw_category,
            rest,
        })
    }

    /// Completes the name into its fields once the category is known.
    ///
    /// B-roll needs a spot and at least one trailing segment. Every other
    /// category needs a spot, a person and at least one trailing segment.
    pub fn into_fields(self, category: Category) -> Result<ClipFields, FileError> {
        let required = category.required_fields();
        if self.rest.len() < required {
            return Err(FileError::InsufficientFields {
                category,
                found: self.rest.len(),
                required,
            });
        }

        let mut rest = self.rest.into_iter();
        let spot = rest.next().unwrap_or_default();
        let person = if category.has_person() {
            rest.next()
        } else {
            None
        };

        let fields = ClipFields {
            date: self.date,
            category,
            spot,
            person,
        };
        fields.check_segments()?;
        Ok(fields)
    }
}

/// The resolved values a clip can be grouped by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipFields {
    pub date: String,
    pub category: Category,
    pub spot: String,
    /// Absent for b-roll.
    pub person: Option<String>,
}

impl ClipFields {
    /// Parses, classifies and extracts a file name in one step.
    ///
    /// ```
    /// use clipsort::category::Category;
    /// use clipsort::clip_name::ClipFields;
    ///
    /// let fields = ClipFields::from_file_name("20230115_L_PoolBlock_Jordan_clip1.mov", true).unwrap();
    /// assert_eq!(fields.category, Category::Aroll);
    /// assert_eq!(fields.person.as_deref(), Some("Jordan"));
    /// ```
    pub fn from_file_name(file_name: &str, merge_landed_failed: bool) -> Result<Self, FileError> {
        let parsed = ParsedName::parse(file_name)?;
        let category = Category::classify(&parsed.raw_category, merge_landed_failed)?;
        parsed.into_fields(category)
    }

    /// Looks up the folder name for a grouping key, if this clip has one.
    pub fn get(&self, key: GroupingKey) -> Option<&str> {
        match key {
            GroupingKey::Date => Some(&self.date),
            GroupingKey::Spot => Some(&self.spot),
            GroupingKey::Category => Some(self.category.code()),
            GroupingKey::Person => self.person.as_deref(),
        }
    }

    fn check_segments(&self) -> Result<(), FileError> {
        for key in [GroupingKey::Date, GroupingKey::Spot, GroupingKey::Person] {
            if let Some(value) = self.get(key)
                && (value == "." || value == "..")
            {
                return Err(FileError::UnsafeSegment {
                    key,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

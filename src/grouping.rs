//! Grouping keys and destination path building.
//!
//! A [`SortOrder`] is an ordered list of [`GroupingKey`]s. Each key that a
//! clip has a value for becomes one level of folder nesting, in order:
//!
//! ```
//! use clipsort::clip_name::ClipFields;
//! use clipsort::grouping::SortOrder;
//! use std::path::Path;
//!
//! let order = SortOrder::parse("spot, category");
//! let fields = ClipFields::from_file_name("20230115_L_PoolBlock_Jordan_clip1.mov", false).unwrap();
//! assert_eq!(
//!     order.target_dir(Path::new("out"), &fields),
//!     Path::new("out").join("PoolBlock").join("L")
//! );
//! ```
//!
//! The offered sort orders come from a JSON preset list in the same format as
//! the `sort_config.json` shipped with the original tool.

use crate::clip_name::ClipFields;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A field a clip can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupingKey {
    Date,
    Spot,
    Category,
    Person,
}

impl GroupingKey {
    /// Every key, in the order they appear in a clip name.
    pub const ALL: [GroupingKey; 4] = [
        GroupingKey::Date,
        GroupingKey::Category,
        GroupingKey::Spot,
        GroupingKey::Person,
    ];

    /// Matches a trimmed, case-insensitive label such as `"spot"`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.label().eq_ignore_ascii_case(label))
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupingKey::Date => "date",
            GroupingKey::Spot => "spot",
            GroupingKey::Category => "category",
            GroupingKey::Person => "person",
        }
    }
}

impl std::fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered grouping keys that decide the folder nesting.
///
/// Blank entries are dropped. Labels that are not a known key are kept aside
/// so callers can warn about them, but they never affect placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    keys: Vec<GroupingKey>,
    unknown: Vec<String>,
}

impl SortOrder {
    pub fn new(keys: Vec<GroupingKey>) -> Self {
        Self {
            keys,
            unknown: Vec::new(),
        }
    }

    /// Parses the comma-separated form, e.g. `"date, spot, category"`.
    ///
    /// Labels are trimmed and matched case-insensitively, so `"Spot"` selects
    /// the spot key. An empty or blank string yields a flat sort order.
    pub fn parse(labels: &str) -> Self {
        Self::from_labels(labels.split(','))
    }

    /// Builds a sort order from individual labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order = Self::default();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            match GroupingKey::from_label(label) {
                Some(key) => order.keys.push(key),
                None => order.unknown.push(label.to_string()),
            }
        }
        order
    }

    pub fn keys(&self) -> &[GroupingKey] {
        &self.keys
    }

    /// Labels that did not match any grouping key.
    pub fn unknown_labels(&self) -> &[String] {
        &self.unknown
    }

    /// True when every clip goes straight into the base directory.
    pub fn is_flat(&self) -> bool {
        self.keys.is_empty()
    }

    /// Computes the destination directory for a clip under `base`.
    ///
    /// Keys the clip has no value for (person on b-roll) are skipped.
    pub fn target_dir(&self, base: &Path, fields: &ClipFields) -> PathBuf {
        let mut target = base.to_path_buf();
        for value in self.keys.iter().filter_map(|key| fields.get(*key)) {
            if !value.is_empty() {
                target.push(value);
            }
        }
        target
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.keys.iter().map(GroupingKey::label).collect();
        f.write_str(&labels.join(", "))
    }
}

/// Errors while loading sort order presets.
#[derive(Debug)]
pub enum PresetError {
    /// The preset file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The preset file is not a JSON list of sort orders.
    Invalid(String),
    /// A preset was requested by an index past the end of the list.
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for PresetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Failed to read presets {}: {}", path.display(), source)
            }
            Self::Invalid(reason) => write!(f, "Invalid presets file: {}", reason),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Preset {} does not exist ({} presets available)", index, len)
            }
        }
    }
}

impl std::error::Error for PresetError {}

/// One preset entry: either `"spot, category"` or `["spot", "category"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PresetEntry {
    Joined(String),
    Keys(Vec<String>),
}

/// The list of sort orders offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPresets {
    presets: Vec<String>,
}

impl SortPresets {
    /// Presets used when no preset file is configured.
    pub fn builtin() -> Self {
        Self {
            presets: [
                "spot, category",
                "category, spot",
                "date, spot, category",
                "spot, category, person",
                "person, spot",
                "date",
                "",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }

    /// Parses a JSON preset list.
    ///
    /// ```
    /// use clipsort::grouping::SortPresets;
    ///
    /// let presets = SortPresets::from_json(r#"["spot, category", ["date", "person"]]"#).unwrap();
    /// assert_eq!(presets.labels(), ["spot, category", "date, person"]);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        let entries: Vec<PresetEntry> =
            serde_json::from_str(json).map_err(|e| PresetError::Invalid(e.to_string()))?;

        let presets = entries
            .into_iter()
            .map(|entry| match entry {
                PresetEntry::Joined(joined) => joined.trim().to_string(),
                PresetEntry::Keys(keys) => keys
                    .iter()
                    .map(|k| k.trim())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect();

        Ok(Self { presets })
    }

    /// Loads a JSON preset list from disk.
    pub fn load(path: &Path) -> Result<Self, PresetError> {
        let json = fs::read_to_string(path).map_err(|e| PresetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&json)
    }

    /// Preset strings as written, in order.
    pub fn labels(&self) -> &[String] {
        &self.presets
    }

    /// Returns the sort order at `index`.
    pub fn get(&self, index: usize) -> Result<SortOrder, PresetError> {
        self.presets
            .get(index)
            .map(|preset| SortOrder::parse(preset))
            .ok_or(PresetError::IndexOutOfRange {
                index,
                len: self.presets.len(),
            })
    }
}

impl Default for SortPresets {
    fn default() -> Self {
        Self::builtin()
    }
}

//! clipsort - sort media clips into folders by their file names
//!
//! Clips named `DATE_CATEGORY_SPOT_PERSON_...` are parsed, classified into
//! landed/failed/b-roll/a-roll, and copied or moved into nested folders built
//! from an ordered list of grouping keys.

pub mod batch;
pub mod category;
pub mod cli;
pub mod clip_name;
pub mod config;
pub mod grouping;
pub mod output;

pub use batch::{
    BatchConfig, BatchError, BatchHandle, BatchReport, BatchResult, BatchRunner, FileOutcome,
    Placement, Progress, run_batch,
};
pub use category::Category;
pub use clip_name::{ClipFields, FileError, ParsedName};
pub use config::{CompiledFilters, Config, ConfigError};
pub use grouping::{GroupingKey, PresetError, SortOrder, SortPresets};

pub use cli::{CliArgs, run_cli};

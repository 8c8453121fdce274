//! Command-line interface for clipsort.
//!
//! This module handles:
//! - Argument parsing
//! - Merging arguments with the configuration file
//! - Running the batch on a worker thread while drawing progress
//! - Reporting placements and errors

use crate::batch::{BatchConfig, BatchRunner};
use crate::config::Config;
use crate::grouping::{GroupingKey, SortOrder};
use crate::output::OutputFormatter;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    name = "clipsort",
    about = "Sort clips named DATE_CATEGORY_SPOT_PERSON_... into folders"
)]
pub struct CliArgs {
    /// Directory containing the clips
    #[arg(value_hint = clap::ValueHint::DirPath, required_unless_present = "list_presets")]
    pub input: Option<PathBuf>,

    /// Where sorted clips are copied to (not needed with --in-place)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Comma-separated grouping keys, e.g. "spot, category"
    #[arg(short, long, conflicts_with = "preset")]
    pub sort: Option<String>,

    /// Use the sort order preset with this index (see --list-presets)
    #[arg(short, long, value_name = "INDEX")]
    pub preset: Option<usize>,

    /// Merge landed (L) and failed (F) clips into A-roll (A)
    #[arg(long, conflicts_with = "no_merge")]
    pub merge: bool,

    /// Keep landed and failed clips apart
    #[arg(long)]
    pub no_merge: bool,

    /// Move clips within the input directory instead of copying them
    #[arg(short, long)]
    pub in_place: bool,

    /// Show where clips would go without touching anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Configuration file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// JSON file with sort order presets
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub presets: Option<PathBuf>,

    /// List the sort order presets and exit
    #[arg(long)]
    pub list_presets: bool,

    /// Print every placed clip
    #[arg(short, long)]
    pub verbose: bool,
}

/// Runs the CLI with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use clipsort::cli::{CliArgs, run_cli};
///
/// let args = CliArgs::parse_from(["clipsort", "/footage/card1", "-o", "/footage/sorted"]);
/// if let Err(e) = run_cli(args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: CliArgs) -> Result<(), String> {
    let config = Config::load(args.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    if args.list_presets {
        return list_presets(&args, &config);
    }

    let batch_config = build_batch_config(&args, &config)?;
    sort_clips(batch_config, args.verbose)
}

/// Resolves arguments and configuration into a batch configuration.
///
/// Command-line flags win over the configuration file.
pub fn build_batch_config(args: &CliArgs, config: &Config) -> Result<BatchConfig, String> {
    let input_dir = args
        .input
        .clone()
        .ok_or_else(|| "An input directory is required".to_string())?;

    let sort_order = match (&args.sort, args.preset) {
        (Some(sort), _) => SortOrder::parse(sort),
        (None, Some(index)) => config
            .presets(args.presets.as_deref())
            .and_then(|presets| presets.get(index))
            .map_err(|e| e.to_string())?,
        (None, None) => config.sort_order(),
    };

    let merge_landed_failed = if args.merge {
        true
    } else if args.no_merge {
        false
    } else {
        config.defaults.merge_landed_failed
    };

    let modify_in_place =
        args.in_place || (config.defaults.modify_in_place && args.output.is_none());

    let filters = config
        .filters
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    Ok(BatchConfig {
        input_dir,
        output_dir: args.output.clone(),
        sort_order,
        merge_landed_failed,
        modify_in_place,
        dry_run: args.dry_run,
        filters,
    })
}

fn list_presets(args: &CliArgs, config: &Config) -> Result<(), String> {
    let presets = config
        .presets(args.presets.as_deref())
        .map_err(|e| e.to_string())?;

    OutputFormatter::header("Sort order presets");
    for (index, label) in presets.labels().iter().enumerate() {
        let label = if label.trim().is_empty() {
            "(no subfolders)"
        } else {
            label.as_str()
        };
        OutputFormatter::plain(&format!("  {}: {}", index, label));
    }

    let keys: Vec<&str> = GroupingKey::ALL.iter().map(GroupingKey::label).collect();
    OutputFormatter::info(&format!("Grouping keys: {}", keys.join(", ")));
    Ok(())
}

fn sort_clips(batch_config: BatchConfig, verbose: bool) -> Result<(), String> {
    let dry_run = batch_config.dry_run;
    let in_place = batch_config.modify_in_place;

    if dry_run {
        OutputFormatter::dry_run_notice("No files will be moved or copied.");
    }
    OutputFormatter::info(&format!(
        "Sorting clips in: {}",
        batch_config.input_dir.display()
    ));
    match (&batch_config.output_dir, in_place) {
        (_, true) => OutputFormatter::plain("Mode: move within the input directory"),
        (Some(output), false) => {
            OutputFormatter::plain(&format!("Mode: copy to {}", output.display()))
        }
        (None, false) => {}
    }
    if batch_config.sort_order.is_flat() {
        OutputFormatter::plain("Sort order: (no subfolders)");
    } else {
        OutputFormatter::plain(&format!("Sort order: {}", batch_config.sort_order));
    }
    for label in batch_config.sort_order.unknown_labels() {
        OutputFormatter::warning(&format!("Ignoring unknown grouping key '{}'", label));
    }
    if batch_config.merge_landed_failed {
        OutputFormatter::plain("Merging landed and failed clips into A-roll");
    }

    let handle = BatchRunner::new(batch_config).spawn();
    let pb = OutputFormatter::create_progress_bar(0);
    for progress in handle.progress().iter() {
        pb.set_length(progress.total as u64);
        pb.set_position(progress.done as u64);
        pb.set_message(format!("Processing: {}/{}", progress.done, progress.total));
    }
    pb.finish_and_clear();

    let report = handle.join().map_err(|e| e.to_string())?;

    if verbose || dry_run {
        OutputFormatter::header(if dry_run { "PLANNED" } else { "PLACED" });
        OutputFormatter::placements(&report);
    }
    if !report.pruned_dirs.is_empty() {
        OutputFormatter::plain(&format!(
            "Removed {} empty director{}",
            report.pruned_dirs.len(),
            if report.pruned_dirs.len() == 1 { "y" } else { "ies" }
        ));
    }

    OutputFormatter::summary_table(&report.category_counts(), report.success_count());

    let errors = report.errors();
    OutputFormatter::error_report(&errors);

    if errors.is_empty() {
        OutputFormatter::success("Processing complete. 0 errors.");
    } else {
        OutputFormatter::warning(&format!(
            "Processing complete. {} error{}.",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["clipsort"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn test_config_defaults_apply() {
        let batch = build_batch_config(&args(&["in", "-o", "out"]), &Config::default()).unwrap();
        assert_eq!(batch.input_dir, PathBuf::from("in"));
        assert_eq!(batch.output_dir, Some(PathBuf::from("out")));
        assert_eq!(batch.sort_order, SortOrder::parse("spot, category"));
        assert!(batch.merge_landed_failed);
        assert!(!batch.modify_in_place);
        assert!(!batch.dry_run);
    }

    #[test]
    fn test_flags_override_config() {
        let batch = build_batch_config(
            &args(&["in", "--in-place", "--no-merge", "-s", "date", "-n"]),
            &Config::default(),
        )
        .unwrap();
        assert!(batch.modify_in_place);
        assert!(!batch.merge_landed_failed);
        assert!(batch.dry_run);
        assert_eq!(batch.sort_order.keys(), [GroupingKey::Date]);
    }

    #[test]
    fn test_empty_sort_flag_means_no_subfolders() {
        let batch =
            build_batch_config(&args(&["in", "-o", "out", "-s", ""]), &Config::default()).unwrap();
        assert!(batch.sort_order.is_flat());
    }

    #[test]
    fn test_preset_selects_sort_order() {
        let batch =
            build_batch_config(&args(&["in", "-o", "out", "-p", "2"]), &Config::default()).unwrap();
        assert_eq!(
            batch.sort_order.keys(),
            [GroupingKey::Date, GroupingKey::Spot, GroupingKey::Category]
        );
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let result = build_batch_config(&args(&["in", "-o", "out", "-p", "99"]), &Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_in_place_yields_to_explicit_output() {
        let mut config = Config::default();
        config.defaults.modify_in_place = true;

        let batch = build_batch_config(&args(&["in"]), &config).unwrap();
        assert!(batch.modify_in_place);

        let batch = build_batch_config(&args(&["in", "-o", "out"]), &config).unwrap();
        assert!(!batch.modify_in_place);
    }

    #[test]
    fn test_conflicting_flags_are_rejected() {
        assert!(CliArgs::try_parse_from(["clipsort", "in", "--merge", "--no-merge"]).is_err());
        assert!(CliArgs::try_parse_from(["clipsort", "in", "-s", "spot", "-p", "1"]).is_err());
    }

    #[test]
    fn test_input_required_unless_listing_presets() {
        assert!(CliArgs::try_parse_from(["clipsort"]).is_err());
        assert!(CliArgs::try_parse_from(["clipsort", "--list-presets"]).is_ok());
    }
}

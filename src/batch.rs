//! Batch runs: enumerate clips, work out where each belongs and put it there.
//!
//! A run walks the input directory, sends every file name through
//! [`ClipFields::from_file_name`] and [`SortOrder::target_dir`], then moves
//! (in place) or copies the file into the computed folder. Problems with a
//! single file never stop the run; they are collected in the [`BatchReport`].
//! Only setup problems such as a missing input directory are fatal.

use crate::category::Category;
use crate::clip_name::{ClipFields, FileError};
use crate::config::CompiledFilters;
use crate::grouping::SortOrder;
use filetime::FileTime;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use walkdir::WalkDir;

/// Errors that abort a whole run before any file is touched.
#[derive(Debug)]
pub enum BatchError {
    /// The input directory does not exist or is not a directory.
    InvalidInputDir { path: PathBuf, source: io::Error },
    /// Copy mode was requested without an output directory.
    MissingOutputDir,
    /// The output directory could not be created.
    OutputDirCreationFailed { path: PathBuf, source: io::Error },
    /// The input directory could not be read.
    InputWalkFailed { path: PathBuf, reason: String },
    /// The background worker panicked.
    WorkerPanicked,
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInputDir { path, source } => {
                write!(f, "Invalid input directory {}: {}", path.display(), source)
            }
            Self::MissingOutputDir => {
                write!(f, "An output directory is required unless modifying in place")
            }
            Self::OutputDirCreationFailed { path, source } => write!(
                f,
                "Failed to create output directory {}: {}",
                path.display(),
                source
            ),
            Self::InputWalkFailed { path, reason } => {
                write!(f, "Failed to read input directory {}: {}", path.display(), reason)
            }
            Self::WorkerPanicked => write!(f, "The batch worker stopped unexpectedly"),
        }
    }
}

impl std::error::Error for BatchError {}

/// Result type for batch runs.
pub type BatchResult<T> = Result<T, BatchError>;

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    /// Ignored when `modify_in_place` is set.
    pub output_dir: Option<PathBuf>,
    pub sort_order: SortOrder,
    pub merge_landed_failed: bool,
    pub modify_in_place: bool,
    /// Work out destinations without touching the filesystem.
    pub dry_run: bool,
    pub filters: CompiledFilters,
}

impl BatchConfig {
    /// A run that copies clips from `input_dir` into `output_dir`.
    pub fn copy(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: Some(output_dir.into()),
            sort_order: SortOrder::default(),
            merge_landed_failed: false,
            modify_in_place: false,
            dry_run: false,
            filters: CompiledFilters::default(),
        }
    }

    /// A run that moves clips around inside `input_dir`.
    pub fn in_place(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: None,
            sort_order: SortOrder::default(),
            merge_landed_failed: false,
            modify_in_place: true,
            dry_run: false,
            filters: CompiledFilters::default(),
        }
    }
}

/// Where a clip went (or would go).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Category,
}

/// The terminal result for one input file.
#[derive(Debug)]
pub enum FileOutcome {
    Moved(Placement),
    Copied(Placement),
    /// Dry run: the file would have been placed here.
    Planned(Placement),
    Failed { file_name: String, error: FileError },
}

impl FileOutcome {
    pub fn placement(&self) -> Option<&Placement> {
        match self {
            Self::Moved(p) | Self::Copied(p) | Self::Planned(p) => Some(p),
            Self::Failed { .. } => None,
        }
    }

    pub fn destination(&self) -> Option<&Path> {
        self.placement().map(|p| p.destination.as_path())
    }

    pub fn is_success(&self) -> bool {
        self.placement().is_some()
    }
}

/// Everything that happened during one run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per processed file, in processing order.
    pub outcomes: Vec<FileOutcome>,
    /// Directories removed after an in-place run.
    pub pruned_dirs: Vec<PathBuf>,
    /// Problems with the tree itself: unreadable subdirectories during the
    /// walk, or empty directories that could not be removed.
    pub tree_errors: Vec<(String, String)>,
}

impl BatchReport {
    /// All `(name, reason)` pairs; empty for a clean run.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Failed { file_name, error } => {
                    Some((file_name.clone(), error.to_string()))
                }
                _ => None,
            })
            .chain(self.tree_errors.iter().cloned())
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.tree_errors.is_empty() && self.outcomes.iter().all(FileOutcome::is_success)
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// Placed files per category, keyed by the category description.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for placement in self.outcomes.iter().filter_map(FileOutcome::placement) {
            *counts
                .entry(placement.category.description().to_string())
                .or_insert(0) += 1;
        }
        counts
    }
}

/// A progress update from a background run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// A run executing on its own thread.
pub struct BatchHandle {
    progress: mpsc::Receiver<Progress>,
    worker: thread::JoinHandle<BatchResult<BatchReport>>,
}

impl BatchHandle {
    /// Progress updates; the channel closes when the run finishes.
    pub fn progress(&self) -> &mpsc::Receiver<Progress> {
        &self.progress
    }

    /// Waits for the run to finish.
    pub fn join(self) -> BatchResult<BatchReport> {
        self.worker
            .join()
            .unwrap_or(Err(BatchError::WorkerPanicked))
    }
}

/// Runs one batch over an input tree.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Processes every file under the input directory.
    ///
    /// `on_progress(done, total)` is called after each file, whether it was
    /// placed or not.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchError`] only for setup problems. Per-file problems end
    /// up in the returned report.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use clipsort::batch::{BatchConfig, BatchRunner};
    /// use clipsort::grouping::SortOrder;
    ///
    /// let mut config = BatchConfig::copy("/footage/card1", "/footage/sorted");
    /// config.sort_order = SortOrder::parse("spot, category");
    ///
    /// let report = BatchRunner::new(config)
    ///     .run(|done, total| println!("{}/{}", done, total))
    ///     .expect("input directory should exist");
    /// for (name, reason) in report.errors() {
    ///     eprintln!("{}: {}", name, reason);
    /// }
    /// ```
    pub fn run<F>(&self, mut on_progress: F) -> BatchResult<BatchReport>
    where
        F: FnMut(usize, usize),
    {
        let base_dir = self.prepare()?;
        let mut report = BatchReport::default();

        let files = self.collect_files(&mut report)?;
        let total = files.len();

        for (index, path) in files.iter().enumerate() {
            report.outcomes.push(self.process_file(path, &base_dir));
            on_progress(index + 1, total);
        }

        if self.config.modify_in_place && !self.config.dry_run {
            prune_empty_dirs(&self.config.input_dir, true, &mut report);
        }

        Ok(report)
    }

    /// Moves the run onto a background thread.
    pub fn spawn(self) -> BatchHandle {
        let (sender, progress) = mpsc::channel();
        let worker = thread::spawn(move || {
            self.run(|done, total| {
                // The receiver may already be gone; the run still completes.
                let _ = sender.send(Progress { done, total });
            })
        });
        BatchHandle { progress, worker }
    }

    /// Validates the input and returns the directory clips are placed under.
    fn prepare(&self) -> BatchResult<PathBuf> {
        let input = &self.config.input_dir;
        let metadata = fs::metadata(input).map_err(|e| BatchError::InvalidInputDir {
            path: input.clone(),
            source: e,
        })?;
        if !metadata.is_dir() {
            return Err(BatchError::InvalidInputDir {
                path: input.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }
        fs::read_dir(input).map_err(|e| BatchError::InputWalkFailed {
            path: input.clone(),
            reason: e.to_string(),
        })?;

        if self.config.modify_in_place {
            return Ok(input.clone());
        }

        let output = self
            .config
            .output_dir
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(BatchError::MissingOutputDir)?;
        if !self.config.dry_run {
            fs::create_dir_all(&output).map_err(|e| BatchError::OutputDirCreationFailed {
                path: output.clone(),
                source: e,
            })?;
        }
        Ok(output)
    }

    /// Lists the regular files to process, in a stable order.
    ///
    /// Symlinks are not followed. In copy mode an output directory nested
    /// inside the input directory is not descended into.
    fn collect_files(&self, report: &mut BatchReport) -> BatchResult<Vec<PathBuf>> {
        let input = &self.config.input_dir;
        let nested_output = self.nested_output_dir();

        let walker = WalkDir::new(input)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && nested_output
                        .as_deref()
                        .is_some_and(|nested| entry.path().strip_prefix(input).ok() == Some(nested)))
            });

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let relative = entry.path().strip_prefix(input).unwrap_or(entry.path());
                    if self.config.filters.should_include(relative) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) if e.depth() == 0 => {
                    return Err(BatchError::InputWalkFailed {
                        path: input.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    let name = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| input.display().to_string());
                    report.tree_errors.push((name, e.to_string()));
                }
            }
        }
        Ok(files)
    }

    /// The output directory relative to the input, when it lies inside it.
    fn nested_output_dir(&self) -> Option<PathBuf> {
        if self.config.modify_in_place {
            return None;
        }
        let output = fs::canonicalize(self.config.output_dir.as_ref()?).ok()?;
        let input = fs::canonicalize(&self.config.input_dir).ok()?;
        output
            .strip_prefix(&input)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    fn process_file(&self, path: &Path, base_dir: &Path) -> FileOutcome {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match self.place_file(path, &file_name, base_dir) {
            Ok(outcome) => outcome,
            Err(error) => FileOutcome::Failed { file_name, error },
        }
    }

    fn place_file(
        &self,
        path: &Path,
        file_name: &str,
        base_dir: &Path,
    ) -> Result<FileOutcome, FileError> {
        let fields = ClipFields::from_file_name(file_name, self.config.merge_landed_failed)?;
        let target_dir = self.config.sort_order.target_dir(base_dir, &fields);
        let destination = match path.file_name() {
            Some(name) => target_dir.join(name),
            None => target_dir.join(file_name),
        };

        let placement = Placement {
            source: path.to_path_buf(),
            destination,
            category: fields.category,
        };

        if self.config.dry_run {
            return Ok(FileOutcome::Planned(placement));
        }

        fs::create_dir_all(&target_dir).map_err(|e| FileError::Filesystem {
            action: "create directory",
            path: target_dir.clone(),
            source: e,
        })?;

        if self.config.modify_in_place {
            move_file(&placement.source, &placement.destination)?;
            Ok(FileOutcome::Moved(placement))
        } else {
            copy_file(&placement.source, &placement.destination)?;
            Ok(FileOutcome::Copied(placement))
        }
    }
}

/// Runs a batch and returns just the `(file name, reason)` error log.
///
/// This is the whole contract a front end needs: an empty list means every
/// file was placed.
pub fn run_batch<F>(config: BatchConfig, on_progress: F) -> BatchResult<Vec<(String, String)>>
where
    F: FnMut(usize, usize),
{
    BatchRunner::new(config)
        .run(on_progress)
        .map(|report| report.errors())
}

/// Moves a file, falling back to copy-then-delete across filesystems.
///
/// An existing file at `destination` is never replaced; the move fails and
/// the source stays where it is.
fn move_file(source: &Path, destination: &Path) -> Result<(), FileError> {
    if is_same_file(source, destination) {
        return Ok(());
    }
    if fs::symlink_metadata(destination).is_ok() {
        return Err(FileError::Filesystem {
            action: "move",
            path: source.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", destination.display()),
            ),
        });
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(source, destination)
        }
        Err(e) => Err(FileError::Filesystem {
            action: "move",
            path: source.to_path_buf(),
            source: e,
        }),
    }
}

/// Copies `source` to `destination`, then removes `source`.
///
/// The source is only removed once the copy is complete.
fn copy_then_remove(source: &Path, destination: &Path) -> Result<(), FileError> {
    copy_file(source, destination)?;
    fs::remove_file(source).map_err(|e| FileError::Filesystem {
        action: "remove original",
        path: source.to_path_buf(),
        source: e,
    })
}

/// Whether both paths resolve to the same file on disk.
fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copies a file, keeping its permissions and access/modification times.
///
/// A destination created by a failed copy is removed again.
fn copy_file(source: &Path, destination: &Path) -> Result<(), FileError> {
    if is_same_file(source, destination) {
        return Ok(());
    }

    let existed = destination.exists();
    let copied = fs::copy(source, destination)
        .map_err(|e| ("copy", e))
        .and_then(|_| {
            let metadata = fs::metadata(source).map_err(|e| ("read metadata of", e))?;
            filetime::set_file_times(
                destination,
                FileTime::from_last_access_time(&metadata),
                FileTime::from_last_modification_time(&metadata),
            )
            .map_err(|e| ("preserve timestamps of", e))
        });

    copied.map_err(|(action, e)| {
        if !existed {
            let _ = fs::remove_file(destination);
        }
        FileError::Filesystem {
            action,
            path: source.to_path_buf(),
            source: e,
        }
    })
}

/// Removes empty directories below `dir`, deepest first.
///
/// `dir` itself is kept when `keep` is set. Symlinked directories are not
/// descended into.
fn prune_empty_dirs(dir: &Path, keep: bool, report: &mut BatchReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            report
                .tree_errors
                .push((dir.display().to_string(), e.to_string()));
            return;
        }
    };

    for entry in entries.flatten() {
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            prune_empty_dirs(&entry.path(), false, report);
        }
    }

    if keep {
        return;
    }

    let is_empty = fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        match fs::remove_dir(dir) {
            Ok(()) => report.pruned_dirs.push(dir.to_path_buf()),
            Err(e) => report
                .tree_errors
                .push((dir.display().to_string(), format!("Failed to remove empty directory: {}", e))),
        }
    }
}

//! Project-root discovery and the fixed file layout beneath it.

use std::path::{Path, PathBuf};

use tracing::debug;

pub const DATA_DIR: &str = "data";
pub const MODELS_DIR: &str = "models";
pub const SRC_DIR: &str = "src";

/// Training input, relative to the working directory.
pub const TRAINING_DATA: &str = "data/unequal_ecg_dataset.csv";
/// Prediction input file name inside the data directory.
pub const PREDICTION_INPUT: &str = "new_ecg_data_matched.csv";
/// Prediction output file name inside the data directory.
pub const PREDICTION_OUTPUT: &str = "prediction_results.csv";

/// Sibling directories that mark a project root.
const ROOT_MARKERS: [&str; 3] = [DATA_DIR, MODELS_DIR, SRC_DIR];
/// Markers used before the first training run, when `models` may not exist yet.
const FRESH_ROOT_MARKERS: [&str; 2] = [DATA_DIR, SRC_DIR];

/// A project root and the fixed paths beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Use `root` as-is.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk upward from `start` to the first directory holding `data`,
    /// `models` and `src`. Falls back to `start` itself.
    #[must_use]
    pub fn discover(start: &Path) -> Self {
        Self::discover_with(start, &ROOT_MARKERS)
    }

    /// Like [`ProjectLayout::discover`] but only requires `data` and `src`,
    /// so a root is found before `models` has been created.
    #[must_use]
    pub fn discover_for_training(start: &Path) -> Self {
        Self::discover_with(start, &FRESH_ROOT_MARKERS)
    }

    /// Discover starting at the running executable's directory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from locating the executable.
    pub fn from_executable(for_training: bool) -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        let start = exe.parent().unwrap_or(Path::new("."));
        Ok(if for_training {
            Self::discover_for_training(start)
        } else {
            Self::discover(start)
        })
    }

    fn discover_with(start: &Path, markers: &[&str]) -> Self {
        let start = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());
        let found = start
            .ancestors()
            .find(|dir| markers.iter().all(|m| dir.join(m).is_dir()));
        let root = found.unwrap_or(start.as_path()).to_path_buf();
        debug!(root = %root.display(), matched = found.is_some(), "project root resolved");
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.root.join(MODELS_DIR)
    }

    #[must_use]
    pub fn prediction_input(&self) -> PathBuf {
        self.data_dir().join(PREDICTION_INPUT)
    }

    #[must_use]
    pub fn prediction_output(&self) -> PathBuf {
        self.data_dir().join(PREDICTION_OUTPUT)
    }
}

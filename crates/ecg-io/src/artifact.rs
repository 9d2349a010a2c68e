//! Versioned bincode persistence for the fitted model, scaler and encoder.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ecg_forest::RandomForest;
use ecg_prep::{LabelEncoder, StandardScaler};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Current binary format version.
pub const FORMAT_VERSION: u32 = 1;

pub const MODEL_FILE: &str = "ecg_model.bin";
pub const SCALER_FILE: &str = "scaler.bin";
pub const ENCODER_FILE: &str = "encoder.bin";

/// Which fitted object an artifact file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Model,
    Scaler,
    Encoder,
}

impl ArtifactKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Scaler => "scaler",
            Self::Encoder => "encoder",
        }
    }

    /// File name inside the artifact directory.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Model => MODEL_FILE,
            Self::Scaler => SCALER_FILE,
            Self::Encoder => ENCODER_FILE,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fitted object that can be stored in an [`ArtifactStore`].
pub trait Artifact: Serialize + DeserializeOwned {
    const KIND: ArtifactKind;
}

impl Artifact for RandomForest {
    const KIND: ArtifactKind = ArtifactKind::Model;
}

impl Artifact for StandardScaler {
    const KIND: ArtifactKind = ArtifactKind::Scaler;
}

impl Artifact for LabelEncoder {
    const KIND: ArtifactKind = ArtifactKind::Encoder;
}

/// Leading fields of every artifact file, read before the payload.
#[derive(Deserialize)]
struct Header {
    format_version: u32,
    kind: ArtifactKind,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    format_version: u32,
    kind: ArtifactKind,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    format_version: u32,
    #[allow(dead_code)]
    kind: ArtifactKind,
    payload: T,
}

/// The three fitted objects a prediction run needs.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub forest: RandomForest,
    pub scaler: StandardScaler,
    pub encoder: LabelEncoder,
}

impl ArtifactBundle {
    /// Feature columns a prediction input must provide, in model order.
    #[must_use]
    pub fn required_columns(&self) -> &[String] {
        self.forest.feature_names()
    }

    /// Check that the three objects were fitted together.
    ///
    /// # Errors
    ///
    /// [`IoError::IncompatibleArtifacts`] when the scaler and model disagree
    /// on feature columns, or the model can emit a class the encoder cannot
    /// decode.
    pub fn validate(&self, dir: &Path) -> Result<(), IoError> {
        let incompatible = |reason: String| IoError::IncompatibleArtifacts {
            dir: dir.to_path_buf(),
            reason,
        };
        if self.scaler.feature_names() != self.forest.feature_names() {
            return Err(incompatible(format!(
                "scaler columns {:?} differ from model columns {:?}",
                self.scaler.feature_names(),
                self.forest.feature_names()
            )));
        }
        if self.forest.n_classes() > self.encoder.n_classes() {
            return Err(incompatible(format!(
                "model predicts {} classes but the encoder knows {}",
                self.forest.n_classes(),
                self.encoder.n_classes()
            )));
        }
        Ok(())
    }
}

/// Directory holding the model, scaler and encoder files.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the file for `kind`.
    #[must_use]
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Serialize `value` into its file, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::OutputDirCreate`] | directory cannot be created |
    /// | [`IoError::Serialize`] | bincode encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all, fields(kind = %T::KIND, dir = %self.dir.display()))]
    pub fn save<T: Artifact>(&self, value: &T) -> Result<PathBuf, IoError> {
        fs::create_dir_all(&self.dir).map_err(|e| IoError::OutputDirCreate {
            path: self.dir.clone(),
            source: e,
        })?;

        let envelope = EnvelopeRef {
            format_version: FORMAT_VERSION,
            kind: T::KIND,
            payload: value,
        };
        let bytes = bincode::serialize(&envelope).map_err(|e| IoError::Serialize {
            kind: T::KIND.as_str(),
            source: e,
        })?;

        let path = self.path(T::KIND);
        fs::write(&path, &bytes).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), size_bytes = bytes.len(), "artifact saved");
        Ok(path)
    }

    /// Read and decode the file for `T`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::ArtifactNotFound`] | file does not exist |
    /// | [`IoError::ReadArtifact`] | file read failed |
    /// | [`IoError::Deserialize`] | bincode decoding failed |
    /// | [`IoError::IncompatibleVersion`] | format version mismatch |
    /// | [`IoError::WrongKind`] | file holds a different artifact |
    #[instrument(skip_all, fields(kind = %T::KIND, dir = %self.dir.display()))]
    pub fn load<T: Artifact>(&self) -> Result<T, IoError> {
        let path = self.path(T::KIND);
        let bytes = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IoError::ArtifactNotFound {
                    kind: T::KIND.as_str(),
                    path: path.clone(),
                }
            } else {
                IoError::ReadArtifact {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        let deserialize_error = |e: bincode::Error| IoError::Deserialize {
            path: path.clone(),
            source: e,
        };
        let header: Header = bincode::deserialize(&bytes).map_err(deserialize_error)?;
        if header.format_version != FORMAT_VERSION {
            return Err(IoError::IncompatibleVersion {
                path: path.clone(),
                expected: FORMAT_VERSION,
                found: header.format_version,
            });
        }
        if header.kind != T::KIND {
            return Err(IoError::WrongKind {
                path: path.clone(),
                expected: T::KIND.as_str(),
                found: header.kind.as_str(),
            });
        }

        let envelope: Envelope<T> = bincode::deserialize(&bytes).map_err(deserialize_error)?;
        debug!(size_bytes = bytes.len(), "artifact loaded");
        Ok(envelope.payload)
    }

    /// Save all three artifacts, model first.
    ///
    /// # Errors
    ///
    /// Any error from [`ArtifactStore::save`]. Files written before the
    /// failure are left in place.
    pub fn save_bundle(&self, bundle: &ArtifactBundle) -> Result<Vec<PathBuf>, IoError> {
        Ok(vec![
            self.save(&bundle.forest)?,
            self.save(&bundle.scaler)?,
            self.save(&bundle.encoder)?,
        ])
    }

    /// Load all three artifacts and check they belong together.
    ///
    /// # Errors
    ///
    /// Any error from [`ArtifactStore::load`], or
    /// [`IoError::IncompatibleArtifacts`].
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn load_bundle(&self) -> Result<ArtifactBundle, IoError> {
        let bundle = ArtifactBundle {
            forest: self.load()?,
            scaler: self.load()?,
            encoder: self.load()?,
        };
        bundle.validate(&self.dir)?;
        info!(
            n_trees = bundle.forest.n_trees(),
            n_features = bundle.forest.n_features(),
            classes = ?bundle.encoder.classes(),
            "artifacts loaded"
        );
        Ok(bundle)
    }
}

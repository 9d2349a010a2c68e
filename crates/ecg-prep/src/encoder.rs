//! Bijection between class-name strings and integer codes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PrepError;

/// Maps class names to codes `0..n_classes`.
///
/// Codes follow the sorted order of the distinct names, so fitting the
/// same label set always yields the same mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the distinct labels.
    ///
    /// # Errors
    ///
    /// [`PrepError::EmptyDataset`] when `labels` is empty.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self, PrepError> {
        if labels.is_empty() {
            return Err(PrepError::EmptyDataset);
        }
        let distinct: BTreeSet<&str> = labels.iter().map(AsRef::as_ref).collect();
        let classes: Vec<String> = distinct.into_iter().map(str::to_owned).collect();
        debug!(n_classes = classes.len(), ?classes, "label encoder fitted");
        Ok(Self { classes })
    }

    /// Fit on `labels` and return their codes.
    ///
    /// # Errors
    ///
    /// [`PrepError::EmptyDataset`] when `labels` is empty.
    pub fn fit_transform<S: AsRef<str>>(labels: &[S]) -> Result<(Self, Vec<usize>), PrepError> {
        let encoder = Self::fit(labels)?;
        let codes = encoder.transform(labels)?;
        Ok((encoder, codes))
    }

    /// Code of a single label.
    ///
    /// # Errors
    ///
    /// [`PrepError::UnknownLabel`] for a label not seen while fitting.
    pub fn encode(&self, label: &str) -> Result<usize, PrepError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| PrepError::UnknownLabel {
                label: label.to_owned(),
                known: self.classes.clone(),
            })
    }

    /// Name of a single code.
    ///
    /// # Errors
    ///
    /// [`PrepError::UnknownCode`] for a code outside `0..n_classes`.
    pub fn decode(&self, code: usize) -> Result<&str, PrepError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(PrepError::UnknownCode {
                code,
                n_classes: self.classes.len(),
            })
    }

    /// Codes for every label.
    ///
    /// # Errors
    ///
    /// [`PrepError::UnknownLabel`] for the first unseen label.
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, PrepError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    /// Names for every code.
    ///
    /// # Errors
    ///
    /// [`PrepError::UnknownCode`] for the first unknown code.
    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>, PrepError> {
        codes
            .iter()
            .map(|&c| self.decode(c).map(str::to_owned))
            .collect()
    }

    /// Known classes in code order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

// Persisted classifier: the fitted forest plus the ordered feature names it was trained on.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::csv_reader::Table;
use crate::error::{FraudError, Result};
use crate::forest::RandomForest;

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    // Overwrites any existing file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self).map_err(|e| FraudError::Model(e.to_string()))?;
        writer.flush()?;
        info!(path = %path.display(), features = self.n_features(), "model saved");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FraudError::load(path, e))?;
        let artifact: ModelArtifact = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| FraudError::load(path, e))?;
        if artifact.forest.n_features != artifact.n_features() {
            return Err(FraudError::load(path, "feature metadata does not match the stored forest"));
        }
        info!(
            path = %path.display(),
            features = artifact.n_features(),
            trees = artifact.forest.trees.len(),
            "model loaded"
        );
        Ok(artifact)
    }

    pub fn predict(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        if records.ncols() != self.n_features() {
            return Err(FraudError::DimensionMismatch {
                expected: self.n_features(),
                actual: records.ncols(),
            });
        }
        self.forest.predict(records)
    }

    pub fn predict_one(&self, features: &[f64]) -> Result<usize> {
        let row = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| FraudError::Parse(e.to_string()))?;
        let labels = self.predict(&row)?;
        labels.first().copied().ok_or_else(|| FraudError::Model("empty prediction".to_string()))
    }

    // Checks that `features` carries exactly the training columns, in training order
    pub fn check_schema(&self, features: &Table) -> Result<()> {
        if features.headers == self.feature_names {
            return Ok(());
        }
        let missing: Vec<&str> = self.feature_names.iter()
            .filter(|name| !features.headers.contains(name))
            .map(String::as_str)
            .collect();
        let unexpected: Vec<&str> = features.headers.iter()
            .filter(|name| !self.feature_names.contains(name))
            .map(String::as_str)
            .collect();

        let reason = if missing.is_empty() && unexpected.is_empty() {
            "columns are not in training order".to_string()
        } else {
            format!("missing columns {:?}, unexpected columns {:?}", missing, unexpected)
        };
        Err(FraudError::Schema(format!(
            "uploaded file does not match the model's {} features: {}",
            self.n_features(),
            reason
        )))
    }
}

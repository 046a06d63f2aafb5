//! On-disk model format.
//!
//! Layout: 8-byte magic, little-endian `u32` format version, then the
//! bincode-encoded [`ModelArtifact`]. Files are written to a temporary
//! sibling and renamed into place, so readers see either the old file or the
//! complete new one.
//!
//! Loading validates the decoded artifact against the running build (feature
//! layout, fitted-component shapes, lexicon) before any model is built from it.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::MatchError;
use crate::features::{JobEncoders, FEATURE_COLUMNS};
use crate::scoring::regressor::{MatchModel, MatchPolicy, ModelProvenance};
use crate::text::{Lexicon, PreprocessorState, SkillExtractor, TextPreprocessor};
use crate::training::forest::RandomForest;
use crate::training::metrics::TrainingMetrics;
use crate::training::scaler::StandardScaler;
use crate::training::vectorizer::TfidfVectorizer;

pub const ARTIFACT_MAGIC: &[u8; 8] = b"JLMODEL\0";
pub const ARTIFACT_VERSION: u32 = 1;

const HEADER_LEN: usize = ARTIFACT_MAGIC.len() + 4;

/// Everything needed to rebuild a `MatchModel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub provenance: ModelProvenance,
    pub metrics: TrainingMetrics,
    pub feature_columns: Vec<String>,
    pub preprocessor: PreprocessorState,
    pub lexicon_fingerprint: Vec<String>,
    pub encoders: JobEncoders,
    pub vectorizer: TfidfVectorizer,
    pub scaler: StandardScaler,
    pub forest: RandomForest,
    pub policy: MatchPolicy,
}

impl ModelArtifact {
    pub fn from_model(model: &MatchModel) -> Self {
        Self {
            provenance: model.provenance.clone(),
            metrics: model.metrics.clone(),
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            preprocessor: model.preprocessor.state(),
            lexicon_fingerprint: model.extractor.lexicon().fingerprint(),
            encoders: model.encoders.clone(),
            vectorizer: model.vectorizer.clone(),
            scaler: model.scaler.clone(),
            forest: model.forest.clone(),
            policy: model.policy.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), MatchError> {
        let save_err = |reason: String| MatchError::ArtifactSave {
            path: path.to_path_buf(),
            reason,
        };

        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| save_err(format!("encode failed: {e}")))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(ARTIFACT_MAGIC)?;
        tmp.write_all(&ARTIFACT_VERSION.to_le_bytes())?;
        tmp.write_all(&payload)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .map_err(|e| save_err(format!("rename failed: {}", e.error)))?;

        info!(
            path = %path.display(),
            bytes = HEADER_LEN + payload.len(),
            artifact_id = %self.provenance.artifact_id,
            "Saved model artifact"
        );
        Ok(())
    }

    /// Reads and decodes the file. Shape checks happen in `into_model`.
    pub fn load(path: &Path) -> Result<Self, MatchError> {
        let load_err = |reason: String| MatchError::ArtifactLoad {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| load_err(format!("read failed: {e}")))?;
        if bytes.len() < HEADER_LEN || &bytes[..ARTIFACT_MAGIC.len()] != ARTIFACT_MAGIC {
            return Err(load_err("not a model artifact (bad magic)".into()));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[ARTIFACT_MAGIC.len()..HEADER_LEN]);
        let version = u32::from_le_bytes(version);
        if version != ARTIFACT_VERSION {
            return Err(load_err(format!(
                "unsupported format version {version} (expected {ARTIFACT_VERSION})"
            )));
        }

        let (artifact, read): (Self, usize) =
            bincode::serde::decode_from_slice(&bytes[HEADER_LEN..], bincode::config::standard())
                .map_err(|e| load_err(format!("decode failed: {e}")))?;
        if HEADER_LEN + read != bytes.len() {
            return Err(load_err(format!(
                "{} trailing bytes after payload",
                bytes.len() - HEADER_LEN - read
            )));
        }
        Ok(artifact)
    }

    /// First inconsistency between this artifact and the running build.
    pub fn validate(&self, lexicon: &Lexicon) -> Result<(), String> {
        if self.feature_columns.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(format!(
                "feature columns {:?} do not match {:?}",
                self.feature_columns, FEATURE_COLUMNS
            ));
        }
        if !self.scaler.is_consistent() || self.scaler.width() != FEATURE_COLUMNS.len() {
            return Err(format!(
                "scaler width {} does not match {} feature columns",
                self.scaler.width(),
                FEATURE_COLUMNS.len()
            ));
        }
        if !self.vectorizer.is_consistent() {
            return Err("vectorizer vocabulary and idf are inconsistent".into());
        }
        let expected = FEATURE_COLUMNS.len() + self.vectorizer.vocabulary_len();
        if self.forest.n_features() != expected {
            return Err(format!(
                "forest expects {} inputs, pipeline produces {expected}",
                self.forest.n_features()
            ));
        }
        if !self.forest.is_well_formed() {
            return Err("forest contains out-of-range node references".into());
        }
        let encoders = [
            &self.encoders.work_type,
            &self.encoders.company_size,
            &self.encoders.country,
        ];
        if !encoders.iter().all(|e| e.is_well_formed()) {
            return Err("categorical encoder classes are malformed".into());
        }
        if self.lexicon_fingerprint != lexicon.fingerprint() {
            return Err("skill lexicon differs from the one the model was trained with".into());
        }
        self.policy.validate().map_err(|e| e.to_string())
    }

    pub fn into_model(self, lexicon: Arc<Lexicon>, path: &Path) -> Result<MatchModel, MatchError> {
        self.validate(&lexicon)
            .map_err(|reason| MatchError::ArtifactLoad {
                path: path.to_path_buf(),
                reason,
            })?;
        Ok(MatchModel {
            preprocessor: TextPreprocessor::from_state(&self.preprocessor),
            extractor: SkillExtractor::new(lexicon),
            encoders: self.encoders,
            vectorizer: self.vectorizer,
            scaler: self.scaler,
            forest: self.forest,
            policy: self.policy,
            provenance: self.provenance,
            metrics: self.metrics,
        })
    }
}

impl MatchModel {
    pub fn save(&self, path: &Path) -> Result<(), MatchError> {
        ModelArtifact::from_model(self).save(path)
    }

    /// Loads and validates an artifact written by [`MatchModel::save`].
    pub fn load(path: &Path, lexicon: Arc<Lexicon>) -> Result<Self, MatchError> {
        let model = ModelArtifact::load(path)?.into_model(lexicon, path)?;
        info!(
            path = %path.display(),
            artifact_id = %model.provenance.artifact_id,
            vocabulary = model.vocabulary_len(),
            "Loaded model artifact"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchRequest;
    use crate::scoring::MatchScorer;
    use crate::text::lexicon::BUILTIN_GROUPS;
    use crate::training::pipeline::tests::{corpus, small_config};
    use crate::training::train;

    fn trained() -> MatchModel {
        train(&corpus(), &small_config(), Lexicon::shared()).unwrap().0
    }

    fn requests() -> Vec<MatchRequest> {
        vec![
            MatchRequest {
                user_skills: vec!["python".into(), "sql".into()],
                user_experience: 2.5,
                job_description: "Python engineer with SQL and AWS".into(),
                ..Default::default()
            },
            MatchRequest {
                user_skills: vec!["react".into()],
                user_experience: 7.0,
                job_description: "Frontend developer".into(),
                job_requirements: Some("React and TypeScript".into()),
                job_responsibilities: Some("Build UI components".into()),
            },
        ]
    }

    #[test]
    fn test_round_trip_reproduces_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let model = trained();
        model.save(&path).unwrap();

        let loaded = MatchModel::load(&path, Lexicon::shared()).unwrap();
        assert_eq!(loaded.provenance(), model.provenance());
        for req in requests() {
            assert_eq!(loaded.predict_match(&req), model.predict_match(&req));
        }
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"old").unwrap();

        trained().save(&path).unwrap();
        assert!(ModelArtifact::load(&path).is_ok());
        // no temp files left behind
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_corrupt_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        trained().save(&path).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() / 2);
        fs::write(&path, &bytes).unwrap();
        assert!(matches!(
            MatchModel::load(&path, Lexicon::shared()),
            Err(MatchError::ArtifactLoad { .. })
        ));

        fs::write(&path, b"definitely not a model").unwrap();
        assert!(matches!(
            MatchModel::load(&path, Lexicon::shared()),
            Err(MatchError::ArtifactLoad { .. })
        ));
    }

    #[test]
    fn test_version_mismatch_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        trained().save(&path).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes[ARTIFACT_MAGIC.len()..HEADER_LEN].copy_from_slice(&99u32.to_le_bytes());
        fs::write(&path, &bytes).unwrap();
        match MatchModel::load(&path, Lexicon::shared()) {
            Err(MatchError::ArtifactLoad { reason, .. }) => assert!(reason.contains("version 99")),
            other => panic!("expected version error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ModelArtifact::load(&dir.path().join("absent.bin")),
            Err(MatchError::ArtifactLoad { .. })
        ));
    }

    #[test]
    fn test_rejects_other_lexicon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        trained().save(&path).unwrap();

        let narrow = Arc::new(Lexicon::new(&BUILTIN_GROUPS[..1]).unwrap());
        match MatchModel::load(&path, narrow) {
            Err(MatchError::ArtifactLoad { reason, .. }) => assert!(reason.contains("lexicon")),
            other => panic!("expected lexicon error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let mut artifact = ModelArtifact::from_model(&trained());
        artifact.feature_columns.pop();
        assert!(artifact.validate(&Lexicon::shared()).is_err());

        let mut artifact = ModelArtifact::from_model(&trained());
        artifact.scaler = StandardScaler::fit(&[[1.0, 2.0]]).unwrap();
        assert!(artifact.validate(&Lexicon::shared()).is_err());
    }
}

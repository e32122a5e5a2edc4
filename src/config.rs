//! Engine configuration
//!
//! Every tunable the search engine uses lives here: the classifier
//! vocabulary, retrieval bounds, scorer constants and request defaults.
//! A JSON file can override any subset; missing sections fall back to the
//! built-in defaults below.

use crate::error::AppError;
use crate::search::ranking::ScoringWeights;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Clinical specialties and document vocabulary that must never be treated
/// as a person's name (Spanish-language deployments)
const DEFAULT_DOMAIN_TERMS: &[&str] = &[
    "ALERGOLOGIA", "ANALISIS", "ANESTESIOLOGIA", "BIOMETRIA", "CARDIOLOGIA", "CIRUGIA",
    "CIRUGIA GENERAL", "CONSULTA", "CONSULTA EXTERNA", "DERMATOLOGIA", "DIAGNOSTICO",
    "ELECTROCARDIOGRAMA", "ENDOCRINOLOGIA", "ESTUDIO", "EXPEDIENTE", "GASTROENTEROLOGIA",
    "GERIATRIA", "GINECOLOGIA", "HEMATOLOGIA", "HEMOGRAMA", "HOSPITALIZACION",
    "INFECTOLOGIA", "LABORATORIO", "MEDICINA GENERAL", "MEDICINA INTERNA", "NEFROLOGIA",
    "NEUMOLOGIA", "NEUROLOGIA", "NUTRICION", "OBSTETRICIA", "ODONTOLOGIA", "OFTALMOLOGIA",
    "ONCOLOGIA", "ORTOPEDIA", "OTORRINOLARINGOLOGIA", "PEDIATRIA", "PSICOLOGIA",
    "PSIQUIATRIA", "RADIOLOGIA", "RAYOS X", "RECETA", "RECETA MEDICA", "REHABILITACION",
    "RESONANCIA", "RESULTADOS", "REUMATOLOGIA", "TERAPIA INTENSIVA", "TOMOGRAFIA",
    "TRAUMATOLOGIA", "ULTRASONIDO", "URGENCIAS", "UROLOGIA",
];

/// Morphology typical of clinical vocabulary, as regular expressions matched
/// against the normalized (uppercase) term
const DEFAULT_DOMAIN_PATTERNS: &[&str] = &[
    r"LOGIA",
    r"GRAFIA",
    r"SCOPIA",
    r"TERAPIA",
    r"PATIA",
    r"(ITIS|OSIS|ALGIA|ECTOMIA|PLASTIA|EMIA)\b",
];

/// Particles that join compound surnames ("DE LA CRUZ", "PEREZ Y GOMEZ")
const DEFAULT_CONNECTIVES: &[&str] = &[
    "DE", "DEL", "LA", "LAS", "LOS", "Y", "E", "VAN", "VON", "DA", "DOS", "DI",
];

const CONFIG_FILE_NAME: &str = "config.json";

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub retrieval: RetrievalConfig,
    pub scoring: ScoringWeights,
    pub defaults: SearchDefaults,
}

/// Vocabulary the query classifier uses to spot domain terms
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub domain_terms: Vec<String>,
    pub domain_patterns: Vec<String>,
    pub connectives: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            domain_terms: owned(DEFAULT_DOMAIN_TERMS),
            domain_patterns: owned(DEFAULT_DOMAIN_PATTERNS),
            connectives: owned(DEFAULT_CONNECTIVES),
        }
    }
}

/// Per-strategy result bounds for candidate retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub exact_limit: usize,
    pub prefix_limit: usize,
    pub substring_limit: usize,
    /// Run the broad scan only while fewer candidates than this were found
    pub fallback_trigger: usize,
    pub fallback_limit: usize,
    /// Suggestions fetch `limit * suggestion_overfetch` records to survive duplicates
    pub suggestion_overfetch: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            exact_limit: 50,
            prefix_limit: 50,
            substring_limit: 50,
            fallback_trigger: 20,
            fallback_limit: 150,
            suggestion_overfetch: 2,
        }
    }
}

/// Request defaults applied when callers omit a value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub limit: usize,
    pub suggestion_limit: usize,
    pub min_similarity: f64,
    /// Threshold for the exact patient documents lookup
    pub patient_min_similarity: f64,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            limit: 20,
            suggestion_limit: 10,
            min_similarity: 0.3,
            patient_min_similarity: 0.9,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `path`, or from the platform config directory
    /// when no path is given. A missing default file yields built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(AppError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("No config at {}, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: EngineConfig = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;

        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let r = &self.retrieval;
        for (field, value) in [
            ("retrieval.exact_limit", r.exact_limit),
            ("retrieval.prefix_limit", r.prefix_limit),
            ("retrieval.substring_limit", r.substring_limit),
            ("retrieval.fallback_limit", r.fallback_limit),
            ("retrieval.suggestion_overfetch", r.suggestion_overfetch),
            ("defaults.limit", self.defaults.limit),
            ("defaults.suggestion_limit", self.defaults.suggestion_limit),
        ] {
            if value == 0 {
                return Err(AppError::Config(format!("{} must be greater than zero", field)));
            }
        }

        check_unit_range(self.defaults.min_similarity, "defaults.min_similarity")?;
        check_unit_range(
            self.defaults.patient_min_similarity,
            "defaults.patient_min_similarity",
        )?;

        self.scoring.validate()
    }
}

/// Range check shared by every threshold-like config field
pub(crate) fn check_unit_range(value: f64, field: &str) -> Result<(), AppError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::Config(format!(
            "{} must be between 0.0 and 1.0, got {}",
            field, value
        )));
    }
    Ok(())
}

/// `{config_dir}/patient-search/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("patient-search").join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.fallback_trigger, 20);
        assert_eq!(config.defaults.min_similarity, 0.3);
        assert!(config.classifier.domain_terms.iter().any(|t| t == "CARDIOLOGIA"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"retrieval": {{"fallback_limit": 500}}, "scoring": {{"prefix_weight": 0.95}}}}"#
        )
        .unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.retrieval.fallback_limit, 500);
        assert_eq!(config.retrieval.exact_limit, 50);
        assert_eq!(config.scoring.prefix_weight, 0.95);
        assert_eq!(config.scoring.substring_weight, 0.8);
        assert!(!config.classifier.connectives.is_empty());
    }

    #[test]
    fn test_vocabulary_can_be_replaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"classifier": {{"domain_terms": ["INVOICE"], "domain_patterns": []}}}}"#
        )
        .unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.classifier.domain_terms, vec!["INVOICE".to_string()]);
        assert!(config.classifier.domain_patterns.is_empty());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"defaults": {{"min_similarity": 1.5}}}}"#).unwrap();
        let err = EngineConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"retrieval": {{"prefix_limit": 0}}}}"#).unwrap();
        let err = EngineConfig::load(Some(file.path())).unwrap_err();
        assert!(err.message().contains("retrieval.prefix_limit"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = EngineConfig::load(Some(Path::new("/no/such/config.json"))).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = EngineConfig::load(Some(file.path())).unwrap_err();
        assert!(err.message().contains("Failed to parse"));
    }
}

//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`
//! and `APP_*` env vars (nested keys separated by `__`). Settings are
//! validated once and then passed explicitly into every pipeline stage.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Category, PerCategory};

/// Tolerance used when checking that category weights sum to one.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

pub struct Config {
    figment: Figment,
    /// Directory of an explicitly given config file. Relative paths in it
    /// resolve against this directory.
    base_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Self::defaults().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, base_dir: None })
    }

    /// Defaults overlaid by a single explicit file and `APP_*` variables.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let figment = Self::defaults()
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"));
        let base_dir = path.parent().map(Path::to_path_buf);
        Ok(Self { figment, base_dir })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed, validated settings for one comparison run.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        settings.validate()?;
        if let (Some(base), Some(dir)) = (&self.base_dir, &settings.encoder.model_dir) {
            let resolved = resolve_with_base(base, dir);
            settings.encoder.model_dir = Some(resolved.to_string_lossy().into_owned());
        }
        Ok(settings)
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scoring: ScoringConfig,
    pub extraction: ExtractionConfig,
    pub encoder: EncoderConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.extraction.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: PerCategory<f64>,
    pub max_batch_size: usize,
    /// An encoder call slower than this counts as an encoding failure.
    pub encode_timeout_ms: u64,
    /// Applied to each clamped cosine; 1.0 leaves scores untouched.
    pub similarity_exponent: f64,
    pub stopwords: Vec<String>,
    /// Normalized edit-distance similarity for reporting a matched skill.
    pub skill_match_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: PerCategory { experience: 0.5, education: 0.2, skills: 0.3 },
            max_batch_size: 20,
            encode_timeout_ms: 30_000,
            similarity_exponent: 1.0,
            stopwords: words(DEFAULT_STOPWORDS),
            skill_match_threshold: 0.85,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        validate_weights(&self.weights)?;
        if self.max_batch_size == 0 {
            return Err(Error::Configuration("max_batch_size must be at least 1".into()));
        }
        if !self.similarity_exponent.is_finite() || self.similarity_exponent <= 0.0 {
            return Err(Error::Configuration(format!(
                "similarity_exponent must be a positive number, got {}",
                self.similarity_exponent
            )));
        }
        if !(0.0..=1.0).contains(&self.skill_match_threshold) {
            return Err(Error::Configuration(format!(
                "skill_match_threshold must lie in [0, 1], got {}",
                self.skill_match_threshold
            )));
        }
        Ok(())
    }
}

/// Weights must be finite, non-negative and sum to 1.0.
pub fn validate_weights(weights: &PerCategory<f64>) -> Result<()> {
    for (category, w) in weights.iter() {
        if !w.is_finite() || *w < 0.0 {
            return Err(Error::Configuration(format!(
                "weight for {category} must be a non-negative number, got {w}"
            )));
        }
    }
    let sum: f64 = weights.iter().map(|(_, w)| *w).sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(Error::Configuration(format!(
            "category weights must sum to 1.0, got {sum:.6}"
        )));
    }
    Ok(())
}

/// Heading keywords of one language. `other` lists headings of sections
/// that are not scored; they only terminate the preceding section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadingSet {
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub skills: Vec<String>,
    pub other: Vec<String>,
}

impl HeadingSet {
    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::Experience => &self.experience,
            Category::Education => &self.education,
            Category::Skills => &self.skills,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub languages: Vec<String>,
    pub headings: BTreeMap<String, HeadingSet>,
    /// Alternate skill spelling or translation -> canonical tag.
    pub synonyms: BTreeMap<String, String>,
    pub degree_keywords: Vec<String>,
    pub institution_keywords: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let mut headings = BTreeMap::new();
        headings.insert(
            "en".to_string(),
            HeadingSet {
                experience: words(&[
                    "Experience",
                    "Work Experience",
                    "Professional Experience",
                    "Work History",
                    "Employment History",
                    "Employment",
                    "Career History",
                ]),
                education: words(&["Education", "Academic Background", "Education and Training"]),
                skills: words(&[
                    "Skills",
                    "Technical Skills",
                    "Core Competencies",
                    "Competencies",
                    "Key Skills",
                ]),
                other: words(&[
                    "Summary",
                    "Profile",
                    "Objective",
                    "Contact",
                    "Projects",
                    "Languages",
                    "Certifications",
                    "Certificates",
                    "Courses",
                    "References",
                    "Interests",
                    "Hobbies",
                    "Personal Skills",
                    "Awards",
                    "Publications",
                ]),
            },
        );
        headings.insert(
            "tr".to_string(),
            HeadingSet {
                experience: words(&["Deneyim", "İş Deneyimi", "Deneyimler", "İş Geçmişi"]),
                education: words(&["Eğitim", "Eğitim Bilgileri"]),
                skills: words(&["Yetenekler", "Yetkinlikler", "Teknik Beceriler", "Beceriler"]),
                other: words(&[
                    "Özet",
                    "Profil",
                    "İletişim",
                    "Projeler",
                    "Yabancı Dil",
                    "Yabancı Diller",
                    "Sertifikalar",
                    "Kurslar",
                    "Referanslar",
                    "Kişisel Beceriler",
                    "Hobiler",
                ]),
            },
        );

        let synonyms = [
            ("yazılımcı", "developer"),
            ("yazılım geliştirici", "developer"),
            ("geliştirici", "developer"),
            ("software developer", "developer"),
            ("software engineer", "developer"),
            ("js", "javascript"),
            ("ts", "typescript"),
            ("node.js", "nodejs"),
            ("node", "nodejs"),
            ("reactjs", "react"),
            ("react.js", "react"),
            ("postgres", "postgresql"),
            ("amazon web services", "aws"),
            ("google cloud platform", "gcp"),
            ("google cloud", "gcp"),
            ("k8s", "kubernetes"),
            ("golang", "go"),
            ("veri analizi", "data analysis"),
            ("makine öğrenmesi", "machine learning"),
            ("ml", "machine learning"),
            ("proje yönetimi", "project management"),
            ("takım çalışması", "teamwork"),
            ("iletişim", "communication"),
        ]
        .into_iter()
        .map(|(a, c)| (a.to_string(), c.to_string()))
        .collect();

        Self {
            languages: words(&["en", "tr"]),
            headings,
            synonyms,
            degree_keywords: words(&[
                "B.Sc", "BSc", "B.S.", "B.A.", "Bachelor", "M.Sc", "MSc", "M.S.", "M.A.", "Master",
                "MBA", "Ph.D", "PhD", "Doctorate", "Associate Degree", "Diploma", "High School",
                "Lisans", "Yüksek Lisans", "Önlisans", "Doktora", "Lise",
            ]),
            institution_keywords: words(&[
                "University", "College", "Institute", "School", "Academy", "Üniversitesi",
                "Üniversite", "Lisesi", "Enstitüsü", "Fakültesi", "Yüksekokulu",
            ]),
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(Error::Configuration("at least one language must be requested".into()));
        }
        for lang in &self.languages {
            let Some(set) = self.headings.get(lang) else {
                return Err(Error::Configuration(format!(
                    "no heading keyword set for language '{lang}'"
                )));
            };
            if Category::ALL.iter().all(|c| set.for_category(*c).is_empty()) {
                return Err(Error::Configuration(format!(
                    "heading keyword set for language '{lang}' is empty"
                )));
            }
        }
        Ok(())
    }

    /// Heading sets of the requested languages, in request order.
    pub fn active_headings(&self) -> impl Iterator<Item = &HeadingSet> {
        self.languages.iter().filter_map(|l| self.headings.get(l))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncoderBackend {
    /// Deterministic hashed bag-of-words vectors; no model files needed.
    #[default]
    Hashing,
    XlmRoberta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub backend: EncoderBackend,
    /// Dimensionality of the hashing encoder.
    pub dim: usize,
    /// Maximum token length for transformer encoders.
    pub max_len: usize,
    pub model_dir: Option<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { backend: EncoderBackend::Hashing, dim: 1024, max_len: 256, model_dir: None }
    }
}

const DEFAULT_STOPWORDS: &[&str] = &[
    // English
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "our", "we", "you",
    "your", "looking", "including",
    // Turkish
    "ve", "ile", "için", "bir", "bu", "şu", "o", "de", "da", "ki", "mi", "mı", "olarak",
    "olan", "ilgili", "gibi", "üzere", "üzerinde", "tarafından", "birlikte", "hakkında",
];

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

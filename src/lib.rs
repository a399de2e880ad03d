use std::{fmt, fs, path::Path};

use rand::{SeedableRng, rngs::StdRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{
        classifier::{CategoryThresholds, SeverityClassifier, SeverityRule},
        decoder::RasterDecoder,
        sampler::{CoordinateSource, RandomCoordinates, RasterSampler},
    },
    error::{ConfigError, DecodeError, Result},
};

pub mod error;
pub mod image_utils;
pub mod analysis;
pub mod metadata;
pub mod pipeline;
pub mod report;
pub mod storage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_dimension: u32,
    pub sample_count: u32,
    pub dark_threshold: f64,
    pub severity_rules: Vec<SeverityRule>,
    pub fallback_grade: SeverityGrade,
    pub category_thresholds: CategoryThresholds,
    pub seed: Option<u64>,
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_dimension: 512,
            sample_count: 1000,
            dark_threshold: 80.0,
            severity_rules: SeverityRule::default_rules(),
            fallback_grade: SeverityGrade {
                score: 4,
                band: SeverityBand::Low,
                volume: VolumeClass::Small,
            },
            category_thresholds: CategoryThresholds::default(),
            seed: None,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_dimension == 0 {
            return Err(ConfigError::InvalidParameter(
                "max_dimension must be at least 1".into(),
            ));
        }

        if self.sample_count == 0 {
            return Err(ConfigError::InvalidParameter(
                "sample_count must be at least 1".into(),
            ));
        }

        if !(0.0..=256.0).contains(&self.dark_threshold) {
            return Err(ConfigError::InvalidParameter(format!(
                "dark_threshold {} outside [0, 256]",
                self.dark_threshold
            )));
        }

        let thresholds = &self.category_thresholds;
        if !thresholds.bright_above.is_finite()
            || !thresholds.mid_above.is_finite()
            || thresholds.mid_above > thresholds.bright_above
        {
            return Err(ConfigError::InvalidParameter(format!(
                "category thresholds must satisfy mid_above <= bright_above (got {} / {})",
                thresholds.mid_above, thresholds.bright_above
            )));
        }

        if let Some(rule) = self
            .severity_rules
            .iter()
            .find(|r| !r.min_dark_ratio.is_finite())
        {
            return Err(ConfigError::InvalidParameter(format!(
                "severity rule for band {} has a non-finite dark ratio",
                rule.grade.band
            )));
        }

        Ok(())
    }
}

/// Decodes, samples and classifies single images.
///
/// Holds no per-request state; one engine can serve any number of
/// concurrent analyses.
#[derive(Debug, Clone)]
pub struct SeverityEngine {
    config: AnalysisConfig,
    decoder: RasterDecoder,
    sampler: RasterSampler,
    classifier: SeverityClassifier,
}

impl SeverityEngine {
    pub fn new(config: AnalysisConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config))
    }

    pub fn with_config(self, config: AnalysisConfig) -> std::result::Result<Self, ConfigError> {
        Self::new(config)
    }

    fn assemble(config: AnalysisConfig) -> Self {
        Self {
            decoder: RasterDecoder::new(config.max_dimension),
            sampler: RasterSampler::new(config.sample_count, config.dark_threshold),
            classifier: SeverityClassifier::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn decoder(&self) -> &RasterDecoder {
        &self.decoder
    }

    pub fn sampler(&self) -> &RasterSampler {
        &self.sampler
    }

    pub fn classifier(&self) -> &SeverityClassifier {
        &self.classifier
    }

    pub fn profile<S: CoordinateSource>(&self, bytes: &[u8], source: &mut S) -> Result<RasterProfile> {
        let raster = self.decoder.decode(bytes)?;
        Ok(self.sampler.sample(&raster, source))
    }

    pub fn analyze_with<S: CoordinateSource>(&self, bytes: &[u8], source: &mut S) -> Result<SeverityReport> {
        let profile = self.profile(bytes, source)?;
        Ok(self.classifier.classify(&profile))
    }

    /// Runs one analysis with the configured random source.
    pub fn analyze(&self, bytes: &[u8]) -> Result<SeverityReport> {
        match self.config.seed {
            Some(seed) => {
                let mut source = RandomCoordinates::new(ChaCha8Rng::seed_from_u64(seed));
                self.analyze_with(bytes, &mut source)
            }
            None => {
                let mut source = os_random_source()?;
                self.analyze_with(bytes, &mut source)
            }
        }
    }

    pub fn classify(&self, profile: &RasterProfile) -> SeverityReport {
        self.classifier.classify(profile)
    }

    pub fn analyze_batch(&self, images: &[Vec<u8>]) -> Vec<Result<SeverityReport>> {
        if self.config.parallel {
            images.par_iter().map(|bytes| self.analyze(bytes)).collect()
        } else {
            images.iter().map(|bytes| self.analyze(bytes)).collect()
        }
    }
}

fn os_random_source() -> Result<RandomCoordinates<StdRng>> {
    let rng = StdRng::try_from_os_rng().map_err(|err| DecodeError::RandomSource(err.to_string()))?;
    Ok(RandomCoordinates::new(rng))
}

impl Default for SeverityEngine {
    fn default() -> Self {
        Self::assemble(AnalysisConfig::default())
    }
}

/// Brightness statistics of a downscaled raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterProfile {
    pub width: u32,
    pub height: u32,
    pub total_pixels: u64,
    pub average_brightness: f64,
    pub dark_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBand {
    Low,
    Moderate,
    Critical,
}

impl SeverityBand {
    pub fn colour(&self) -> BandColour {
        match self {
            SeverityBand::Low => BandColour::Green,
            SeverityBand::Moderate => BandColour::Yellow,
            SeverityBand::Critical => BandColour::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Low => "low",
            SeverityBand::Moderate => "moderate",
            SeverityBand::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandColour {
    Green,
    Yellow,
    Red,
}

impl BandColour {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandColour::Green => "green",
            BandColour::Yellow => "yellow",
            BandColour::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeClass {
    Small,
    Medium,
    Large,
}

impl VolumeClass {
    pub fn description(&self) -> &'static str {
        match self {
            VolumeClass::Small => "Small/Bag-sized",
            VolumeClass::Medium => "Medium/Cart-sized",
            VolumeClass::Large => "Large/Truck-sized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WasteCategory {
    #[serde(rename = "Mixed (Plastic, Packaging, Litter)")]
    PlasticPackagingLitter,
    #[serde(rename = "Mixed (Household, Organic)")]
    HouseholdOrganic,
    #[serde(rename = "Mixed (Household, Construction)")]
    HouseholdConstruction,
}

impl WasteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::PlasticPackagingLitter => "Mixed (Plastic, Packaging, Litter)",
            WasteCategory::HouseholdOrganic => "Mixed (Household, Organic)",
            WasteCategory::HouseholdConstruction => "Mixed (Household, Construction)",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Score, band and volume always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityGrade {
    pub score: u8,
    pub band: SeverityBand,
    pub volume: VolumeClass,
}

impl SeverityGrade {
    /// Grades the default rule table can produce.
    pub fn known_grades() -> Vec<SeverityGrade> {
        let config = AnalysisConfig::default();
        config
            .severity_rules
            .iter()
            .map(|rule| rule.grade)
            .chain(std::iter::once(config.fallback_grade))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    pub rounded_brightness: u8,
    pub dark_ratio: f64,
    pub total_pixels: u64,
}

impl ReportMetrics {
    pub fn from_profile(profile: &RasterProfile) -> Self {
        Self {
            rounded_brightness: profile.average_brightness.round().clamp(0.0, 255.0) as u8,
            dark_ratio: image_utils::round_to(profile.dark_ratio, 2),
            total_pixels: profile.total_pixels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredReport")]
pub struct SeverityReport {
    severity_score: u8,
    severity_band: SeverityBand,
    volume_class: VolumeClass,
    category_guess: WasteCategory,
    metrics: ReportMetrics,
}

/// Wire shape of a report; only reaches callers through `TryFrom`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredReport {
    severity_score: u8,
    severity_band: SeverityBand,
    volume_class: VolumeClass,
    category_guess: WasteCategory,
    metrics: ReportMetrics,
}

impl TryFrom<StoredReport> for SeverityReport {
    type Error = String;

    fn try_from(stored: StoredReport) -> std::result::Result<Self, Self::Error> {
        let grade = SeverityGrade {
            score: stored.severity_score.clamp(1, 10),
            band: stored.severity_band,
            volume: stored.volume_class,
        };

        if !SeverityGrade::known_grades().contains(&grade) {
            return Err(format!(
                "score {} with band {} and volume {:?} matches no severity grade",
                stored.severity_score, grade.band, grade.volume
            ));
        }

        Ok(Self::new(grade, stored.category_guess, stored.metrics))
    }
}

impl SeverityReport {
    pub(crate) fn new(grade: SeverityGrade, category: WasteCategory, metrics: ReportMetrics) -> Self {
        Self {
            severity_score: grade.score.clamp(1, 10),
            severity_band: grade.band,
            volume_class: grade.volume,
            category_guess: category,
            metrics,
        }
    }

    pub fn severity_score(&self) -> u8 {
        self.severity_score
    }

    pub fn severity_band(&self) -> SeverityBand {
        self.severity_band
    }

    pub fn volume_class(&self) -> VolumeClass {
        self.volume_class
    }

    pub fn category_guess(&self) -> WasteCategory {
        self.category_guess
    }

    pub fn metrics(&self) -> &ReportMetrics {
        &self.metrics
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    pub fn uniform_png(width: u32, height: u32, colour: [u8; 3]) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb(colour));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }
}

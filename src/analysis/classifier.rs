use serde::{Deserialize, Serialize};

use crate::{
    AnalysisConfig, RasterProfile, ReportMetrics, SeverityBand, SeverityGrade, SeverityReport,
    VolumeClass, WasteCategory,
};

/// Matches when both `total_pixels > min_total_pixels` and
/// `dark_ratio > min_dark_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityRule {
    pub min_total_pixels: u64,
    pub min_dark_ratio: f64,
    pub grade: SeverityGrade,
}

impl SeverityRule {
    pub fn default_rules() -> Vec<SeverityRule> {
        vec![
            SeverityRule {
                min_total_pixels: 400_000,
                min_dark_ratio: 0.4,
                grade: SeverityGrade {
                    score: 9,
                    band: SeverityBand::Critical,
                    volume: VolumeClass::Large,
                },
            },
            SeverityRule {
                min_total_pixels: 200_000,
                min_dark_ratio: 0.25,
                grade: SeverityGrade {
                    score: 7,
                    band: SeverityBand::Moderate,
                    volume: VolumeClass::Medium,
                },
            },
        ]
    }

    pub fn matches(&self, profile: &RasterProfile) -> bool {
        profile.total_pixels > self.min_total_pixels && profile.dark_ratio > self.min_dark_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryThresholds {
    pub bright_above: f64,
    pub mid_above: f64,
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self {
            bright_above: 180.0,
            mid_above: 120.0,
        }
    }
}

impl CategoryThresholds {
    pub fn categorize(&self, average_brightness: f64) -> WasteCategory {
        if average_brightness > self.bright_above {
            WasteCategory::PlasticPackagingLitter
        } else if average_brightness > self.mid_above {
            WasteCategory::HouseholdOrganic
        } else {
            WasteCategory::HouseholdConstruction
        }
    }
}

/// Ordered, first-match-wins mapping from a profile to a report.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityClassifier {
    rules: Vec<SeverityRule>,
    fallback: SeverityGrade,
    categories: CategoryThresholds,
}

impl SeverityClassifier {
    pub fn new(rules: Vec<SeverityRule>, fallback: SeverityGrade, categories: CategoryThresholds) -> Self {
        Self {
            rules,
            fallback,
            categories,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.severity_rules.clone(),
            config.fallback_grade,
            config.category_thresholds,
        )
    }

    pub fn grade(&self, profile: &RasterProfile) -> SeverityGrade {
        self.rules
            .iter()
            .find(|rule| rule.matches(profile))
            .map(|rule| rule.grade)
            .unwrap_or(self.fallback)
    }

    pub fn classify(&self, profile: &RasterProfile) -> SeverityReport {
        SeverityReport::new(
            self.grade(profile),
            self.categories.categorize(profile.average_brightness),
            ReportMetrics::from_profile(profile),
        )
    }
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

pub mod display;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{BandColour, SeverityBand, SeverityReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Critical,
    Moderate,
    Low,
    Hazard,
}

/// Display-ready view of a [`SeverityReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationState {
    pub band: SeverityBand,
    pub colour: BandColour,
    pub label: String,
    pub colour_text: String,
    pub badges: BTreeSet<Badge>,
    pub justification: String,
    pub score_text: String,
    pub volume_text: String,
    pub category: String,
}

impl PresentationState {
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn band_text(band: SeverityBand) -> (&'static str, &'static str, &'static [Badge]) {
    match band {
        SeverityBand::Critical => (
            "Critical dump – urgent response",
            "Red (Critical)",
            &[Badge::Critical, Badge::Hazard],
        ),
        SeverityBand::Moderate => (
            "Moderate dump – scheduled clean-up",
            "Yellow (Moderate)",
            &[Badge::Moderate, Badge::Hazard],
        ),
        SeverityBand::Low => (
            "Minor dump – monitor and prevent",
            "Green (Low)",
            &[Badge::Low],
        ),
    }
}

pub fn justification(report: &SeverityReport) -> String {
    let metrics = report.metrics();
    format!(
        "Estimated severity {}/10 based on image size ({} pixels), average brightness {}, \
         and dark-area ratio {:.2}. Higher dark ratio and larger dumps are treated as more severe.",
        report.severity_score(),
        metrics.total_pixels,
        metrics.rounded_brightness,
        metrics.dark_ratio
    )
}

impl From<&SeverityReport> for PresentationState {
    fn from(report: &SeverityReport) -> Self {
        let band = report.severity_band();
        let (label, colour_text, badges) = band_text(band);

        Self {
            band,
            colour: band.colour(),
            label: label.into(),
            colour_text: colour_text.into(),
            badges: badges.iter().copied().collect(),
            justification: justification(report),
            score_text: format!("{}/10", report.severity_score()),
            volume_text: report.volume_class().description().into(),
            category: report.category_guess().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RasterProfile, analysis::classifier::SeverityClassifier};

    fn report_for(total_pixels: u64, dark_ratio: f64, average_brightness: f64) -> SeverityReport {
        SeverityClassifier::default().classify(&RasterProfile {
            width: 1,
            height: 1,
            total_pixels,
            average_brightness,
            dark_ratio,
        })
    }

    #[test]
    fn test_critical_presentation() {
        let state = PresentationState::from(&report_for(500_000, 0.8, 40.0));

        assert_eq!(state.label, "Critical dump – urgent response");
        assert_eq!(state.colour_text, "Red (Critical)");
        assert_eq!(state.colour, BandColour::Red);
        assert_eq!(state.badges, BTreeSet::from([Badge::Critical, Badge::Hazard]));
        assert_eq!(state.score_text, "9/10");
        assert_eq!(state.volume_text, "Large/Truck-sized");
    }

    #[test]
    fn test_moderate_presentation() {
        let state = PresentationState::from(&report_for(262_144, 1.0, 20.0));

        assert_eq!(state.label, "Moderate dump – scheduled clean-up");
        assert_eq!(state.colour_text, "Yellow (Moderate)");
        assert_eq!(state.badges, BTreeSet::from([Badge::Moderate, Badge::Hazard]));
        assert_eq!(state.category, "Mixed (Household, Construction)");
    }

    #[test]
    fn test_low_presentation_has_no_hazard() {
        let state = PresentationState::from(&report_for(10_000, 0.0, 255.0));

        assert_eq!(state.label, "Minor dump – monitor and prevent");
        assert_eq!(state.colour_text, "Green (Low)");
        assert_eq!(state.badges, BTreeSet::from([Badge::Low]));
        assert_eq!(state.volume_text, "Small/Bag-sized");
    }

    #[test]
    fn test_hazard_badge_iff_not_low() {
        let samples = [
            report_for(500_000, 0.8, 40.0),
            report_for(300_000, 0.3, 40.0),
            report_for(100, 0.0, 40.0),
        ];

        for report in &samples {
            let state = PresentationState::from(report);
            assert_eq!(
                state.has_badge(Badge::Hazard),
                report.severity_band() != SeverityBand::Low
            );
        }
    }

    #[test]
    fn test_justification_wording() {
        let report = report_for(262_144, 1.0, 20.0);
        assert_eq!(
            justification(&report),
            "Estimated severity 7/10 based on image size (262144 pixels), average brightness 20, \
             and dark-area ratio 1.00. Higher dark ratio and larger dumps are treated as more severe."
        );
    }
}

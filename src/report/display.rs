use std::collections::BTreeMap;

use crate::{
    BandColour,
    report::{Badge, PresentationState},
};

pub const STATUS_IMAGE_LOADED: &str = "Image loaded · Click scan to analyse";
pub const STATUS_ANALYSING: &str = "Analysing image content...";
pub const STATUS_ANALYSED: &str = "Image analysed • Report generated";
pub const STATUS_FAILED: &str = "Analysis failed – try another image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    Idle,
    ImageLoaded,
    Analysing,
    Analysed,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Analysed | AnalysisStatus::Failed)
    }
}

/// Owns every piece of mutable display state.
///
/// [`PresentationState`] stays pure; this board is the only thing that
/// changes when a report is shown.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    status: AnalysisStatus,
    status_text: String,
    image_name: Option<String>,
    status_dot: Option<BandColour>,
    score_circle: Option<BandColour>,
    badges: BTreeMap<Badge, bool>,
    fields: Option<PresentationState>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            status: AnalysisStatus::Idle,
            status_text: String::new(),
            image_name: None,
            status_dot: None,
            score_circle: None,
            badges: [Badge::Critical, Badge::Moderate, Badge::Low, Badge::Hazard]
                .into_iter()
                .map(|badge| (badge, false))
                .collect(),
            fields: None,
        }
    }

    pub fn image_loaded(&mut self, name: impl Into<String>) {
        self.clear_colours();
        self.image_name = Some(name.into());
        self.status = AnalysisStatus::ImageLoaded;
        self.status_text = STATUS_IMAGE_LOADED.into();
    }

    pub fn analysing(&mut self) {
        self.status = AnalysisStatus::Analysing;
        self.status_text = STATUS_ANALYSING.into();
    }

    pub fn show(&mut self, state: &PresentationState) {
        self.status_dot = Some(state.colour);
        self.score_circle = Some(state.colour);

        for (badge, visible) in self.badges.iter_mut() {
            *visible = state.has_badge(*badge);
        }

        self.fields = Some(state.clone());
        self.status = AnalysisStatus::Analysed;
        self.status_text = STATUS_ANALYSED.into();
    }

    /// Previously shown report fields are left in place.
    pub fn fail(&mut self) {
        self.status = AnalysisStatus::Failed;
        self.status_text = STATUS_FAILED.into();
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn clear_colours(&mut self) {
        self.status_dot = None;
        self.score_circle = None;
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn image_name(&self) -> Option<&str> {
        self.image_name.as_deref()
    }

    pub fn status_dot(&self) -> Option<BandColour> {
        self.status_dot
    }

    pub fn score_circle(&self) -> Option<BandColour> {
        self.score_circle
    }

    pub fn is_badge_visible(&self, badge: Badge) -> bool {
        self.badges.get(&badge).copied().unwrap_or(false)
    }

    pub fn fields(&self) -> Option<&PresentationState> {
        self.fields.as_ref()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

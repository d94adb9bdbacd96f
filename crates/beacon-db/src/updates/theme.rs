//! Theme update builder.
//!
//! Covers the fields a product manager may edit by hand. Status changes go
//! through review, scoring fields through `record_theme_score`.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ThemeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_notes: Option<Option<String>>,
}

impl ThemeUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.pm_notes.is_none()
    }
}

pub struct ThemeUpdateBuilder(ThemeUpdate);

impl ThemeUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ThemeUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.0.tags = Some(tags);
        self
    }

    #[must_use]
    pub fn pm_notes(mut self, pm_notes: Option<String>) -> Self {
        self.0.pm_notes = Some(pm_notes);
        self
    }

    #[must_use]
    pub fn build(self) -> ThemeUpdate {
        self.0
    }
}

impl Default for ThemeUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

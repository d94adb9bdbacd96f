//! Initiative update builder.

use serde::Serialize;

use beacon_core::enums::{InitiativeStatus, Timeline};

#[derive(Debug, Clone, Default, Serialize)]
pub struct InitiativeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    /// Validated against the initiative state machine before writing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InitiativeStatus>,
}

impl InitiativeUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.owner.is_none()
            && self.objective_id.is_none()
            && self.timeline.is_none()
            && self.status.is_none()
    }
}

pub struct InitiativeUpdateBuilder(InitiativeUpdate);

impl InitiativeUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(InitiativeUpdate::default())
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
    pub fn owner(mut self, owner: Option<String>) -> Self {
        self.0.owner = Some(owner);
        self
    }

    #[must_use]
    pub fn objective_id(mut self, objective_id: Option<String>) -> Self {
        self.0.objective_id = Some(objective_id);
        self
    }

    #[must_use]
    pub const fn timeline(mut self, timeline: Timeline) -> Self {
        self.0.timeline = Some(timeline);
        self
    }

    #[must_use]
    pub const fn status(mut self, status: InitiativeStatus) -> Self {
        self.0.status = Some(status);
        self
    }

    #[must_use]
    pub fn build(self) -> InitiativeUpdate {
        self.0
    }
}

impl Default for InitiativeUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

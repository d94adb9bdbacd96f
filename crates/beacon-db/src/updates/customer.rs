//! Customer update builder.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<Option<String>>,
}

impl CustomerUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.segment.is_none()
    }
}

pub struct CustomerUpdateBuilder(CustomerUpdate);

impl CustomerUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(CustomerUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: Option<String>) -> Self {
        self.0.email = Some(email);
        self
    }

    #[must_use]
    pub fn segment(mut self, segment: Option<String>) -> Self {
        self.0.segment = Some(segment);
        self
    }

    #[must_use]
    pub fn build(self) -> CustomerUpdate {
        self.0
    }
}

impl Default for CustomerUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Entity structs for all Beacon domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `beacon-db/migrations`).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` so the REST
//! layer can return them directly.

mod admin_user;
mod audit;
mod company;
mod customer;
mod feedback;
mod health;
mod initiative;
mod objective;
mod strategy;
mod survey;
mod theme;

pub use admin_user::AdminUser;
pub use audit::AuditEntry;
pub use company::Company;
pub use customer::Customer;
pub use feedback::FeedbackItem;
pub use health::{CustomerHealthScore, HealthReport};
pub use initiative::Initiative;
pub use objective::{KeyResult, Objective};
pub use strategy::{ProductStrategy, StrategicKeyword};
pub use survey::{Survey, SurveyAnswer, SurveyLink, SurveyQuestion, SurveyResponse};
pub use theme::Theme;

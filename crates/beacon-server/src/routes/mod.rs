//! Route tables. Each submodule owns one resource group.

mod ai;
mod audit;
mod customers;
mod feedback;
mod initiatives;
mod objectives;
mod strategy;
mod surveys;
mod themes;
mod users;

use axum::Router;

use crate::AppState;

/// Everything under `/api/admin`. All handlers authenticate.
pub(crate) fn admin_router() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(customers::router())
        .merge(feedback::router())
        .merge(themes::router())
        .merge(initiatives::router())
        .merge(strategy::router())
        .merge(objectives::router())
        .merge(surveys::router())
        .merge(ai::router())
        .merge(audit::router())
}

/// Everything under `/api/surveys`. No authentication.
pub(crate) fn public_router() -> Router<AppState> {
    surveys::public_router()
}

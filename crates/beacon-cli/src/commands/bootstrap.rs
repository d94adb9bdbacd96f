use serde::Serialize;
use tracing::info;

use beacon_core::entities::{AdminUser, Company};
use beacon_core::enums::AdminRole;
use beacon_db::BeaconService;

#[derive(Debug, Serialize)]
pub struct Bootstrapped {
    pub company: Company,
    pub owner: AdminUser,
}

/// Create a company with a single owner so the dashboard has someone to log in as.
pub async fn handle(
    service: &BeaconService,
    company_name: &str,
    auth_user_id: &str,
    email: &str,
) -> anyhow::Result<Bootstrapped> {
    if let Some(existing) = service.find_admin_by_auth_id(auth_user_id).await? {
        anyhow::bail!(
            "auth user {auth_user_id} is already an admin of company {}",
            existing.company_id
        );
    }
    let company = service.create_company(company_name).await?;
    let owner = service
        .for_company(&company.id)
        .create_admin_user(auth_user_id, email, AdminRole::Owner)
        .await?;
    info!(company_id = %company.id, owner_id = %owner.id, "company bootstrapped");
    Ok(Bootstrapped { company, owner })
}

//! Shared test utilities for beacon-db unit tests.

use beacon_core::enums::AdminRole;
use beacon_core::identity::AdminIdentity;

use crate::BeaconDb;
use crate::service::{BeaconService, ServiceSettings};

/// An in-memory, unscoped service.
pub async fn test_service() -> BeaconService {
    let db = BeaconDb::open_local(":memory:").await.unwrap();
    BeaconService::new(db, ServiceSettings::default())
}

/// An in-memory service scoped to a fresh company's owner.
pub async fn scoped_service() -> BeaconService {
    let svc = test_service().await;
    let company = svc.create_company("Acme Analytics").await.unwrap();
    let owner = svc
        .for_company(&company.id)
        .create_admin_user("auth|owner", "owner@acme.test", AdminRole::Owner)
        .await
        .unwrap();
    svc.for_identity(AdminIdentity {
        user_id: owner.id,
        company_id: company.id,
        role: AdminRole::Owner,
    })
}

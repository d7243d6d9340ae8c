//! Staff user entity (database row mapping).

use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct StaffUserEntity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
}

impl StaffUserEntity {
    /// Convert to domain model. Unknown roles get the least privilege.
    pub fn into_domain(self) -> domain::models::StaffUser {
        use domain::models::UserRole;

        domain::models::StaffUser {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            role: self.role.parse::<UserRole>().unwrap_or(UserRole::Staff),
            is_active: self.is_active,
        }
    }
}

impl From<StaffUserEntity> for domain::models::StaffUser {
    fn from(entity: StaffUserEntity) -> Self {
        entity.into_domain()
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is making a request. Passed explicitly into every lifecycle operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl RequestContext {
    pub fn customer(user_id: Uuid) -> Self {
        Self { user_id, is_admin: false }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, is_admin: true }
    }

    /// Admins may act on anyone's resources, customers only on their own.
    pub fn can_act_for(&self, owner: Uuid) -> bool {
        self.is_admin || self.user_id == owner
    }
}

//! Explicit authorization capability.
//!
//! Operations that care about identity take an [`Actor`] instead of reading
//! an ambient request context. Authentication itself is an external
//! collaborator; by the time a request reaches a ledger it has been reduced
//! to one of these capabilities.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Who is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// A customer acting on their own resources.
    Customer { user_id: UserId },
    /// An administrative caller.
    Admin,
    /// A trusted internal service (saga downstream calls).
    Internal,
}

impl Actor {
    /// Creates a customer actor.
    pub fn customer(user_id: UserId) -> Self {
        Actor::Customer { user_id }
    }

    /// Returns true for administrative callers.
    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }

    /// Returns true if this actor may act on resources owned by `owner`.
    ///
    /// Admins and internal services may act on anything; customers only on
    /// their own resources.
    pub fn can_act_for(&self, owner: UserId) -> bool {
        match self {
            Actor::Customer { user_id } => *user_id == owner,
            Actor::Admin | Actor::Internal => true,
        }
    }

    /// Returns the customer user id, if this is a customer.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::Customer { user_id } => Some(*user_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_acts_only_for_self() {
        let owner = UserId::new();
        let other = UserId::new();
        let actor = Actor::customer(owner);

        assert!(actor.can_act_for(owner));
        assert!(!actor.can_act_for(other));
    }

    #[test]
    fn admin_and_internal_act_for_anyone() {
        let owner = UserId::new();
        assert!(Actor::Admin.can_act_for(owner));
        assert!(Actor::Internal.can_act_for(owner));
    }

    #[test]
    fn only_admin_is_admin() {
        assert!(Actor::Admin.is_admin());
        assert!(!Actor::Internal.is_admin());
        assert!(!Actor::customer(UserId::new()).is_admin());
    }
}

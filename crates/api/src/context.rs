use pawmart_core::UserId;

/// Authenticated caller identity for a request.
///
/// This is immutable and must be present for all protected routes; the auth
/// middleware inserts it after validating the bearer token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuyerContext {
    user_id: UserId,
}

impl BuyerContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

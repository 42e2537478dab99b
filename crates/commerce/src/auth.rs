//! Operator authorization context.
//!
//! Callers resolve their session/claims however they like (ID token, session
//! cookie, service account) and hand the coordinator an explicit
//! [`OperatorClaims`] value. The core never consults ambient session state.

use serde::{Deserialize, Serialize};

use grove_core::{OperatorRole, ProviderId, UserId};

/// Authenticated operator identity presented to order-mutating operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorClaims {
    /// The authenticated user behind the call.
    pub uid: UserId,
    /// Role granted to this operator.
    pub role: OperatorRole,
    /// The provider this operator is assigned to, if any.
    ///
    /// An operator may only act on orders belonging to this provider.
    pub provider: Option<ProviderId>,
}

impl OperatorClaims {
    /// Claims for an operator assigned to a provider.
    #[must_use]
    pub const fn new(uid: UserId, role: OperatorRole, provider: ProviderId) -> Self {
        Self {
            uid,
            role,
            provider: Some(provider),
        }
    }

    /// Whether these claims authorize order mutation for `provider`.
    #[must_use]
    pub fn manages(&self, provider: &ProviderId) -> bool {
        self.role.can_manage_orders() && self.provider.as_ref() == Some(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manages_own_provider_only() {
        let claims = OperatorClaims::new(
            UserId::new("U1"),
            OperatorRole::Operator,
            ProviderId::new("P1"),
        );
        assert!(claims.manages(&ProviderId::new("P1")));
        assert!(!claims.manages(&ProviderId::new("P2")));
    }

    #[test]
    fn test_viewer_manages_nothing() {
        let claims = OperatorClaims::new(
            UserId::new("U1"),
            OperatorRole::Viewer,
            ProviderId::new("P1"),
        );
        assert!(!claims.manages(&ProviderId::new("P1")));
    }
}

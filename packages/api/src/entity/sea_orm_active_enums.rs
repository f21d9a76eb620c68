//! `SeaORM` active enums

use sea_orm::Iterable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of an order through checkout.
///
/// `AwaitingSession` orders exist before the hosted payment session does. They
/// either get a session attached (`Pending`) or are marked `Failed`, by the
/// checkout itself or by the stale-order sweep.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "awaiting_session")]
    AwaitingSession,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (AwaitingSession, Pending)
                | (AwaitingSession, Failed)
                | (Pending, Paid)
                | (Pending, Expired)
        )
    }

    /// Statuses an order may be in right before it moves to `next`.
    pub fn sources_of(next: OrderStatus) -> Vec<OrderStatus> {
        OrderStatus::iter()
            .filter(|status| status.can_transition_to(next))
            .collect()
    }

    pub fn is_terminal(self) -> bool {
        OrderStatus::iter().all(|next| !self.can_transition_to(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::AwaitingSession.is_terminal());
    }

    #[test]
    fn only_pending_orders_get_paid() {
        assert_eq!(OrderStatus::sources_of(OrderStatus::Paid), vec![OrderStatus::Pending]);
        assert_eq!(
            OrderStatus::sources_of(OrderStatus::Failed),
            vec![OrderStatus::AwaitingSession]
        );
        assert!(!OrderStatus::Failed.can_transition_to(OrderStatus::Paid));
    }
}

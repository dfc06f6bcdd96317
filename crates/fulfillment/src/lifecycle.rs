//! The single path through which order statuses change.

use std::sync::Arc;

use chrono::Utc;
use common::{AccountId, OrderId};
use document_store::DocumentStore;
use domain::{CourierError, CourierProfile, Document, Order, OrderStatus, Repository};

use crate::error::Result;
use crate::payments::PaymentLedger;
use crate::settlement::{SettlementFailure, SettlementFailureHook};

/// Applies order status changes and their side effects.
///
/// Entering `DELIVERED` credits the assigned courier, frees them once no
/// deliveries remain, and confirms an open cash payment. A failed cash
/// confirmation never fails the delivery; it is logged, counted and handed
/// to the [`SettlementFailureHook`]. Cancelling releases the order from the
/// courier that accepted it.
pub struct OrderLifecycle<S: DocumentStore> {
    orders: Repository<S, Order>,
    couriers: Repository<S, CourierProfile>,
    ledger: PaymentLedger<S>,
    settlement_hook: Arc<dyn SettlementFailureHook>,
}

impl<S: DocumentStore + Clone> Clone for OrderLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            couriers: self.couriers.clone(),
            ledger: self.ledger.clone(),
            settlement_hook: self.settlement_hook.clone(),
        }
    }
}

impl<S: DocumentStore + Clone> OrderLifecycle<S> {
    pub fn new(
        store: S,
        ledger: PaymentLedger<S>,
        settlement_hook: Arc<dyn SettlementFailureHook>,
    ) -> Self {
        Self {
            orders: Repository::new(store.clone()),
            couriers: Repository::new(store),
            ledger,
            settlement_hook,
        }
    }

    /// Moves an order to `next` and runs the side effects of that status.
    ///
    /// For `CANCELLED` the note is the cancellation reason.
    #[tracing::instrument(skip(self, note))]
    pub async fn advance(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        actor: Option<AccountId>,
        note: Option<String>,
    ) -> Result<Order> {
        let order = self
            .orders
            .update(order_id, |order| match next {
                OrderStatus::Cancelled => order.cancel(
                    actor,
                    note.unwrap_or_else(|| "Cancelled".to_string()),
                ),
                _ => order.transition(next, actor, note),
            })
            .await?;
        tracing::info!(status = %next, "order status changed");

        match next {
            OrderStatus::Delivered => self.delivered(order, actor).await,
            OrderStatus::Cancelled => {
                self.release_courier(&order).await?;
                Ok(order)
            }
            _ => Ok(order),
        }
    }

    async fn delivered(&self, order: Order, actor: Option<AccountId>) -> Result<Order> {
        let order_id = order.id();

        if let Some(courier_id) = order.courier_id() {
            let delivery_fee = order.delivery_fee();
            let courier = self
                .couriers
                .update(courier_id, |courier| {
                    courier.complete_delivery(order_id, delivery_fee);
                    Ok::<_, CourierError>(())
                })
                .await?;
            metrics::counter!("deliveries_completed_total").increment(1);
            tracing::info!(
                %courier_id,
                total_deliveries = courier.total_deliveries(),
                courier_status = %courier.status(),
                "delivery credited to courier"
            );
        }

        if self.settle_cash(order_id, actor).await {
            // The payment mirror bumped the order's version.
            return Ok(self.orders.load(order_id).await?);
        }
        Ok(order)
    }

    async fn try_settle_cash(&self, order_id: OrderId, actor: Option<AccountId>) -> Result<bool> {
        match self.ledger.get_by_order(order_id).await? {
            Some(payment) if payment.is_cash() && payment.status().is_open() => {
                self.ledger
                    .confirm_cash_by_order_id(order_id, actor)
                    .await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Confirms an open cash payment. Returns true if the order was written.
    async fn settle_cash(&self, order_id: OrderId, actor: Option<AccountId>) -> bool {
        match self.try_settle_cash(order_id, actor).await {
            Ok(settled) => settled,
            Err(e) => {
                metrics::counter!("cash_confirmation_failures_total").increment(1);
                tracing::error!(%order_id, error = %e, "cash confirmation after delivery failed");
                self.settlement_hook
                    .on_failure(SettlementFailure {
                        order_id,
                        confirmer: actor,
                        kind: e.kind(),
                        message: e.to_string(),
                        failed_at: Utc::now(),
                    })
                    .await;
                false
            }
        }
    }

    async fn release_courier(&self, order: &Order) -> Result<()> {
        let Some(courier_id) = order.courier_id() else {
            return Ok(());
        };
        let Some(mut courier) = self.couriers.get(courier_id).await? else {
            return Ok(());
        };
        if courier.release_delivery(order.id()) {
            self.couriers.save(courier).await?;
            tracing::info!(%courier_id, "courier released from cancelled order");
        }
        Ok(())
    }
}

//! Payment lifecycle and its mirror onto orders.

use common::{AccountId, Money, OrderId, PaymentId};
use document_store::DocumentStore;
use domain::{
    Document, Order, OrderError, Payment, PaymentError, PaymentMethod, PaymentStatus,
    ProcessingDetails, Repository,
};
use event_bus::{EventBus, MarketplaceEvent, PaymentEventData};

use crate::error::{FulfillmentError, Result};

/// Owns every payment write.
///
/// Each change is committed payment first, then the order's payment status
/// mirror. The two writes are not atomic; a reader may briefly see the
/// order lag behind its payment.
pub struct PaymentLedger<S: DocumentStore> {
    payments: Repository<S, Payment>,
    orders: Repository<S, Order>,
    bus: EventBus,
}

impl<S: DocumentStore + Clone> Clone for PaymentLedger<S> {
    fn clone(&self) -> Self {
        Self {
            payments: self.payments.clone(),
            orders: self.orders.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl<S: DocumentStore + Clone> PaymentLedger<S> {
    pub fn new(store: S, bus: EventBus) -> Self {
        Self {
            payments: Repository::new(store.clone()),
            orders: Repository::new(store),
            bus,
        }
    }

    /// Writes the payment, then mirrors its status onto the order.
    async fn commit(&self, payment: Payment) -> Result<Payment> {
        let payment = if payment.version().is_initial() {
            self.payments.insert(payment).await?
        } else {
            self.payments.save(payment).await?
        };

        let mirror = payment.status().order_mirror();
        self.orders
            .update(payment.order_id(), |order| {
                order.mirror_payment_status(mirror);
                Ok::<_, OrderError>(())
            })
            .await?;

        Ok(payment)
    }

    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment> {
        Ok(self.payments.load(payment_id).await?)
    }

    pub async fn get_by_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        Ok(self
            .payments
            .get_by_key(&Payment::order_key(order_id))
            .await?)
    }

    /// Creates a pending payment for the order's total.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, order_id: OrderId, method: PaymentMethod) -> Result<Payment> {
        let order = self.orders.load(order_id).await?;
        if self.get_by_order(order_id).await?.is_some() {
            return Err(PaymentError::AlreadyExists { order_id }.into());
        }

        let payment = self.commit(Payment::for_order(&order, method)).await?;
        tracing::info!(payment_id = %payment.id(), amount = %payment.amount(), "payment created");
        Ok(payment)
    }

    /// Starts processing, creating the payment first if the order has none.
    #[tracing::instrument(skip(self, details))]
    pub async fn process(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
        details: ProcessingDetails,
    ) -> Result<Payment> {
        let mut payment = match self.get_by_order(order_id).await? {
            Some(payment) => payment,
            None => {
                let order = self.orders.load(order_id).await?;
                Payment::for_order(&order, method)
            }
        };

        payment.begin_processing(method, details)?;
        let payment = self.commit(payment).await?;

        self.publish(MarketplaceEvent::PaymentProcessed(
            PaymentEventData::from_payment(&payment),
        ))
        .await;
        Ok(payment)
    }

    /// Marks a payment as paid. Confirming twice is a conflict.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(
        &self,
        payment_id: PaymentId,
        transaction_id: Option<String>,
        confirmed_by: Option<AccountId>,
    ) -> Result<Payment> {
        let mut payment = self.payments.load(payment_id).await?;
        payment.complete(transaction_id, confirmed_by)?;
        self.completed(payment).await
    }

    /// Confirms the cash payment of an order.
    ///
    /// Returns the payment unchanged if it is already completed.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_cash_by_order_id(
        &self,
        order_id: OrderId,
        confirmer: Option<AccountId>,
    ) -> Result<Payment> {
        let mut payment = self
            .get_by_order(order_id)
            .await?
            .ok_or(FulfillmentError::PaymentNotFound { order_id })?;

        if payment.status() == PaymentStatus::Completed {
            return Ok(payment);
        }
        if !payment.is_cash() {
            return Err(PaymentError::NotCash {
                method: payment.method(),
            }
            .into());
        }

        payment.complete(None, confirmer)?;
        self.completed(payment).await
    }

    async fn completed(&self, payment: Payment) -> Result<Payment> {
        let payment = self.commit(payment).await?;
        metrics::counter!("payments_completed_total", "method" => payment.method().to_string())
            .increment(1);
        tracing::info!(payment_id = %payment.id(), order_id = %payment.order_id(), "payment completed");

        self.publish(MarketplaceEvent::PaymentCompleted(
            PaymentEventData::from_payment(&payment),
        ))
        .await;
        Ok(payment)
    }

    #[tracing::instrument(skip(self))]
    pub async fn fail(&self, payment_id: PaymentId, reason: String) -> Result<Payment> {
        let mut payment = self.payments.load(payment_id).await?;
        payment.fail(reason.clone())?;
        let payment = self.commit(payment).await?;
        tracing::warn!(%payment_id, %reason, "payment failed");

        self.publish(MarketplaceEvent::PaymentFailed(
            PaymentEventData::from_payment(&payment).with_reason(reason),
        ))
        .await;
        Ok(payment)
    }

    /// Refunds part or all of a completed payment.
    ///
    /// The order shows `REFUNDED` only once the whole amount is refunded.
    #[tracing::instrument(skip(self))]
    pub async fn refund(
        &self,
        payment_id: PaymentId,
        amount: Money,
        reason: String,
        refunded_by: Option<AccountId>,
    ) -> Result<Payment> {
        let mut payment = self.payments.load(payment_id).await?;
        payment.refund(amount, reason.clone(), refunded_by)?;
        let payment = self.commit(payment).await?;
        tracing::info!(%payment_id, %amount, status = %payment.status(), "payment refunded");

        self.publish(MarketplaceEvent::PaymentRefunded(
            PaymentEventData::from_payment(&payment).with_refund(amount, reason),
        ))
        .await;
        Ok(payment)
    }

    async fn publish(&self, event: MarketplaceEvent) {
        self.bus.publish(event).await;
    }
}

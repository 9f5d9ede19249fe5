//! Roadside breakdown assistance
//!
//! ```text
//! Pending -> In Progress -> Completed -> Invoice Generated
//!                       \-> Cancelled
//! ```
//!
//! Driver moves are conditional writes on the status read beforehand, so a
//! second driver accepting the same request loses with `InvalidState`.
//! Customer notifications are sent after the write and never undo it.

use std::sync::Arc;

use sc_contracts::breakdowns::{check_cancellation_reason, check_location, check_transition};
use sc_contracts::{authorize, permissions, Actor};
use sc_core::{Clock, ScError, ScResult};
use sc_db::{BreakdownChange, BreakdownStore, NewBreakdownRequest};
use sc_models::{BreakdownAction, BreakdownCharge, BreakdownRequest, IdCategory, Invoice};
use sc_notifications::{Notification, Notifier};

use crate::identifiers::IdentifierAllocator;

/// Driver input for an invoice
#[derive(Debug, Clone, Default)]
pub struct InvoiceRequest {
    pub distance_km: f64,
    pub additional_charges: f64,
    pub notes: Option<String>,
}

/// A stored invoice with the request it settled
#[derive(Debug, Clone)]
pub struct IssuedInvoice {
    pub invoice: Invoice,
    pub request: BreakdownRequest,
}

#[derive(Clone)]
pub struct BreakdownService {
    breakdowns: Arc<dyn BreakdownStore>,
    ids: IdentifierAllocator,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    breakdown_service_id: String,
}

impl BreakdownService {
    pub fn new(
        breakdowns: Arc<dyn BreakdownStore>,
        ids: IdentifierAllocator,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
        breakdown_service_id: impl Into<String>,
    ) -> Self {
        Self {
            breakdowns,
            ids,
            notifier,
            clock,
            breakdown_service_id: breakdown_service_id.into(),
        }
    }

    pub async fn request_assistance(
        &self,
        actor: &dyn Actor,
        location: &str,
        description: Option<String>,
    ) -> ScResult<BreakdownRequest> {
        authorize(actor, permissions::REQUEST_ASSISTANCE, "request breakdown assistance")?;
        let location = check_location(location)?;

        let request = self
            .breakdowns
            .insert_request(&NewBreakdownRequest {
                customer_id: actor.id().to_string(),
                location,
                description: description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                request_time: self.clock.now(),
            })
            .await?;

        tracing::info!(request_id = request.id, customer_id = %actor.id(), "breakdown requested");
        Ok(request)
    }

    /// Take a pending request; the acting driver becomes its driver
    pub async fn accept(&self, actor: &dyn Actor, request_id: i64) -> ScResult<BreakdownRequest> {
        let change = BreakdownChange::Accept {
            driver_id: actor.id().to_string(),
            at: self.clock.now(),
        };
        let request = self.transition(actor, request_id, change).await?;
        self.notify(
            &request,
            "Driver on the way",
            format!("Driver {} accepted your breakdown request.", actor.id()),
        )
        .await;
        Ok(request)
    }

    pub async fn complete(&self, actor: &dyn Actor, request_id: i64) -> ScResult<BreakdownRequest> {
        let change = BreakdownChange::Complete {
            at: self.clock.now(),
        };
        let request = self.transition(actor, request_id, change).await?;
        self.notify(
            &request,
            "Assistance completed",
            "Your breakdown request has been completed.".to_string(),
        )
        .await;
        Ok(request)
    }

    pub async fn cancel(
        &self,
        actor: &dyn Actor,
        request_id: i64,
        reason: &str,
    ) -> ScResult<BreakdownRequest> {
        authorize(actor, permissions::HANDLE_BREAKDOWN, "handle breakdown requests")?;
        let reason = check_cancellation_reason(reason)?;

        let change = BreakdownChange::Cancel {
            reason: reason.clone(),
            at: self.clock.now(),
        };
        let request = self.transition(actor, request_id, change).await?;
        self.notify(
            &request,
            "Request cancelled",
            format!("Your breakdown request was cancelled: {reason}"),
        )
        .await;
        Ok(request)
    }

    /// Bill a completed request at the catalog rate per kilometre
    pub async fn generate_invoice(
        &self,
        actor: &dyn Actor,
        request_id: i64,
        input: InvoiceRequest,
    ) -> ScResult<IssuedInvoice> {
        authorize(actor, permissions::HANDLE_BREAKDOWN, "handle breakdown requests")?;
        // Input errors come first; the rate is checked once it is known
        BreakdownCharge::compute(input.distance_km, 0.0, input.additional_charges)?;

        let request = self.find_request(request_id).await?;
        check_transition(&request, BreakdownAction::Invoice)?;

        let rate = self
            .breakdowns
            .service_rate(&self.breakdown_service_id)
            .await?
            .ok_or_else(|| ScError::not_found("Service", &self.breakdown_service_id))?;
        let charge = BreakdownCharge::compute(input.distance_km, rate, input.additional_charges)?;

        let id = self.ids.allocate(IdCategory::Invoice).await?;
        let invoice = Invoice {
            id: id.into_string(),
            breakdown_request_id: Some(request_id),
            distance_km: charge.distance_km,
            rate_per_km: charge.rate_per_km,
            service_charge: charge.service_charge,
            additional_charges: charge.additional_charges,
            total: charge.total,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            issued_by: actor.id().to_string(),
            created_at: self.clock.now(),
        };

        let request = match self.breakdowns.record_invoice(&invoice, request_id).await? {
            Some(request) => request,
            None => return Err(self.lost_race(request_id, BreakdownAction::Invoice).await),
        };

        tracing::info!(
            request_id,
            invoice_id = %invoice.id,
            total = invoice.total,
            driver = %actor.id(),
            "breakdown invoiced"
        );
        self.notify(
            &request,
            "Invoice ready",
            format!("Invoice {} for {:.2} is ready.", invoice.id, invoice.total),
        )
        .await;

        Ok(IssuedInvoice { invoice, request })
    }

    pub async fn find_request(&self, request_id: i64) -> ScResult<BreakdownRequest> {
        self.breakdowns
            .find_request(request_id)
            .await?
            .ok_or_else(|| ScError::not_found("BreakdownRequest", request_id))
    }

    async fn transition(
        &self,
        actor: &dyn Actor,
        request_id: i64,
        change: BreakdownChange,
    ) -> ScResult<BreakdownRequest> {
        authorize(actor, permissions::HANDLE_BREAKDOWN, "handle breakdown requests")?;
        let action = change.action();

        let current = self.find_request(request_id).await?;
        check_transition(&current, action)?;

        let updated = match self
            .breakdowns
            .apply_change(request_id, current.status, &change)
            .await?
        {
            Some(request) => request,
            None => return Err(self.lost_race(request_id, action).await),
        };

        tracing::info!(
            request_id,
            from = %current.status,
            to = %updated.status,
            driver = %actor.id(),
            "breakdown request {}",
            action.verb()
        );
        Ok(updated)
    }

    /// Error for a conditional write that matched nothing
    async fn lost_race(&self, request_id: i64, action: BreakdownAction) -> ScError {
        match self.find_request(request_id).await {
            Ok(request) => match check_transition(&request, action) {
                Err(err) => err,
                Ok(_) => ScError::invalid_state(
                    "BreakdownRequest",
                    request_id,
                    request.status,
                    "request changed concurrently",
                ),
            },
            Err(err) => err,
        }
    }

    async fn notify(&self, request: &BreakdownRequest, title: &str, message: String) {
        let Some(customer_id) = request.customer_id.as_deref() else {
            tracing::debug!(request_id = request.id, "request has no customer to notify");
            return;
        };
        let notification =
            Notification::new(customer_id, title, message, self.clock.now()).for_breakdown(request.id);
        self.notifier.notify(notification).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use async_trait::async_trait;
    use sc_models::{BreakdownStatus, Role};
    use sc_notifications::{
        MemoryNotificationStore, NotificationStore, NotifyError, NotifyResult, PushMessage,
        PushSender,
    };

    mockall::mock! {
        Push {}

        #[async_trait]
        impl PushSender for Push {
            async fn send(&self, message: &PushMessage) -> NotifyResult<()>;
        }
    }

    async fn pending(fx: &Fixture) -> BreakdownRequest {
        fx.services
            .breakdowns
            .request_assistance(&fx.customer, "A1 near exit 12", Some("Flat tyre".into()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_breakdown_flow() {
        let fx = Fixture::new().await;
        let driver = fx.actor("D1", Role::Driver);
        let request = pending(&fx).await;
        assert_eq!(request.status, BreakdownStatus::Pending);

        let accepted = fx.services.breakdowns.accept(&driver, request.id).await.unwrap();
        assert_eq!(accepted.status, BreakdownStatus::InProgress);
        assert_eq!(accepted.driver_id.as_deref(), Some("D1"));

        fx.services.breakdowns.complete(&driver, request.id).await.unwrap();

        let issued = fx
            .services
            .breakdowns
            .generate_invoice(
                &driver,
                request.id,
                InvoiceRequest {
                    distance_km: 10.0,
                    additional_charges: 20.0,
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(issued.invoice.id, "INV-0001");
        assert_eq!(issued.invoice.service_charge, 50.0);
        assert_eq!(issued.invoice.total, 70.0);
        assert_eq!(issued.request.status, BreakdownStatus::InvoiceGenerated);
        assert_eq!(issued.request.invoice_id.as_deref(), Some("INV-0001"));

        let notes = fx.notifications.for_customer(&fx.customer.id).await.unwrap();
        assert_eq!(notes.len(), 3);
    }

    #[tokio::test]
    async fn test_second_accept_reports_status() {
        let fx = Fixture::new().await;
        let request = pending(&fx).await;
        fx.services
            .breakdowns
            .accept(&fx.actor("D1", Role::Driver), request.id)
            .await
            .unwrap();

        let err = fx
            .services
            .breakdowns
            .accept(&fx.actor("D2", Role::Driver), request.id)
            .await
            .unwrap_err();
        match err {
            ScError::InvalidState { current, .. } => assert_eq!(current, "InProgress"),
            other => panic!("unexpected error: {other:?}"),
        }
        let stored = fx.services.breakdowns.find_request(request.id).await.unwrap();
        assert_eq!(stored.driver_id.as_deref(), Some("D1"));
    }

    #[tokio::test]
    async fn test_invoice_requires_completed() {
        let fx = Fixture::new().await;
        let request = pending(&fx).await;
        let err = fx
            .services
            .breakdowns
            .generate_invoice(&fx.actor("D1", Role::Driver), request.id, InvoiceRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_invoice_rejects_negative_distance() {
        let fx = Fixture::new().await;
        let request = pending(&fx).await;
        let err = fx
            .services
            .breakdowns
            .generate_invoice(
                &fx.actor("D1", Role::Driver),
                request.id,
                InvoiceRequest {
                    distance_km: -3.0,
                    ..InvoiceRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[tokio::test]
    async fn test_cancel_needs_reason_and_in_progress() {
        let fx = Fixture::new().await;
        let driver = fx.actor("D1", Role::Driver);
        let request = pending(&fx).await;

        let err = fx.services.breakdowns.cancel(&driver, request.id, "  ").await.unwrap_err();
        assert_eq!(err.status_code(), 422);

        let err = fx
            .services
            .breakdowns
            .cancel(&driver, request.id, "Customer unreachable")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);

        fx.services.breakdowns.accept(&driver, request.id).await.unwrap();
        let cancelled = fx
            .services
            .breakdowns
            .cancel(&driver, request.id, " Customer unreachable ")
            .await
            .unwrap();
        assert_eq!(cancelled.status, BreakdownStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Customer unreachable"));

        let err = fx.services.breakdowns.complete(&driver, request.id).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_missing_rate_is_not_found() {
        let fx = Fixture::without_breakdown_rate().await;
        let driver = fx.actor("D1", Role::Driver);
        let request = pending(&fx).await;
        fx.services.breakdowns.accept(&driver, request.id).await.unwrap();
        fx.services.breakdowns.complete(&driver, request.id).await.unwrap();

        let err = fx
            .services
            .breakdowns
            .generate_invoice(&driver, request.id, InvoiceRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScError::NotFound { entity: "Service", .. }));
    }

    #[tokio::test]
    async fn test_push_failure_does_not_fail_accept() {
        let fx = Fixture::new().await;
        let request = pending(&fx).await;

        let mut push = MockPush::new();
        push.expect_send()
            .times(1)
            .returning(|_| Err(NotifyError::Push("provider unavailable".into())));
        let store = Arc::new(MemoryNotificationStore::new());
        let service = BreakdownService::new(
            fx.store.clone(),
            fx.services.ids.clone(),
            Notifier::new(store.clone(), Arc::new(push)),
            Arc::new(fx.clock),
            "SRV-BREAKDOWN",
        );

        let accepted = service
            .accept(&fx.actor("D1", Role::Driver), request.id)
            .await
            .unwrap();
        assert_eq!(accepted.status, BreakdownStatus::InProgress);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_only_customers_request_and_drivers_handle() {
        let fx = Fixture::new().await;
        let err = fx
            .services
            .breakdowns
            .request_assistance(&fx.actor("D1", Role::Driver), "Somewhere", None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let request = pending(&fx).await;
        let err = fx
            .services
            .breakdowns
            .accept(&fx.customer, request.id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let err = fx
            .services
            .breakdowns
            .accept(&fx.actor("D1", Role::Driver), 404)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}

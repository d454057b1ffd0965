//! Settlement service: preview, confirm and amend confirmed orders
//!
//! The settlement core is pure; this service adds the persistence step and
//! the retry policy around it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use shared::{
    is_submittable, ConfirmedOrderPayload, ConfirmedOrderRecord, ErrorKind, OrderForm,
    OrderSettlement, OrderSide, OrderStage, SettlementCalculator, SettlementWarning,
    ValidationError,
};
use uuid::Uuid;

use crate::config::PersistenceConfig;
use crate::error::{AppError, AppResult};
use crate::external::OrderStore;

/// Retry policy for network failures on the order store
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl From<&PersistenceConfig> for RetryPolicy {
    fn from(config: &PersistenceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        }
    }
}

/// Result of a preview: the figures plus everything blocking submission
#[derive(Debug, Clone, Serialize)]
pub struct SettlementPreview {
    pub settlement: OrderSettlement,
    pub errors: Vec<ValidationError>,
    pub submittable: bool,
}

/// A settled order as stored by the order store
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedOrder {
    pub id: Uuid,
    pub side: OrderSide,
    pub stage: OrderStage,
    pub settlement: OrderSettlement,
    pub payload: ConfirmedOrderPayload,
}

/// Settlement service over an order store
#[derive(Clone)]
pub struct SettlementService<S> {
    calculator: Arc<SettlementCalculator>,
    store: S,
    retry: RetryPolicy,
}

impl<S: OrderStore> SettlementService<S> {
    pub fn new(calculator: Arc<SettlementCalculator>, store: S, retry: RetryPolicy) -> Self {
        Self {
            calculator,
            store,
            retry,
        }
    }

    pub fn calculator(&self) -> &SettlementCalculator {
        &self.calculator
    }

    /// Compute the settlement and report validation problems without failing
    pub fn preview(&self, form: impl Into<OrderForm>) -> SettlementPreview {
        let form = form.into();
        let errors = form.validate();
        let settlement = self.calculator.settle(&form.record);
        SettlementPreview {
            submittable: is_submittable(&errors),
            settlement,
            errors,
        }
    }

    /// Validate, settle and persist a new confirmed order.
    ///
    /// The order id is assigned here, before the first write, so a retry
    /// after a lost reply lands on the row the store already has.
    pub async fn confirm(&self, form: impl Into<OrderForm>) -> AppResult<ConfirmedOrder> {
        let form = form.into();
        let record = &form.record;
        if record.id.is_some() || record.stage == OrderStage::Persisted {
            return Err(AppError::Conflict(
                "Order is already confirmed; amend it instead".to_string(),
            ));
        }

        let stage = self.validate(&form, OrderStage::Draft)?;
        let (settlement, payload) = self.freeze(Uuid::new_v4(), record, stage)?;

        let side = record.side;
        let payload_ref = &payload;
        let stored = self
            .with_retry("create", move || self.store.create(side, payload_ref))
            .await?;

        tracing::info!(
            order_id = %stored.id,
            side = ?side,
            invoice = record.invoice_number.as_deref().unwrap_or_default(),
            net_amount = %settlement.net_amount,
            "Confirmed order persisted"
        );

        Ok(ConfirmedOrder {
            id: stored.id,
            side,
            stage: OrderStage::Settled.transition_to(OrderStage::Persisted)?,
            settlement,
            payload,
        })
    }

    /// Re-settle an already persisted order and replace the stored one
    pub async fn amend(&self, id: Uuid, form: impl Into<OrderForm>) -> AppResult<ConfirmedOrder> {
        let form = form.into();
        let record = &form.record;
        self.validate(&form, OrderStage::Draft)?;
        let (settlement, payload) = self.freeze(id, record, OrderStage::Persisted)?;

        let side = record.side;
        let payload_ref = &payload;
        let stored = self
            .with_retry("replace", move || self.store.replace(side, id, payload_ref))
            .await?;

        tracing::info!(
            order_id = %stored.id,
            side = ?side,
            net_amount = %settlement.net_amount,
            "Confirmed order amended"
        );

        Ok(ConfirmedOrder {
            id: stored.id,
            side,
            stage: OrderStage::Settled.transition_to(OrderStage::Persisted)?,
            settlement,
            payload,
        })
    }

    fn validate(&self, form: &OrderForm, stage: OrderStage) -> AppResult<OrderStage> {
        let errors = form.validate();
        if !is_submittable(&errors) {
            tracing::debug!(count = errors.len(), "Order blocked by validation");
            return Err(AppError::Validation { errors });
        }
        Ok(stage.transition_to(OrderStage::Validated)?)
    }

    fn freeze(
        &self,
        id: Uuid,
        record: &ConfirmedOrderRecord,
        stage: OrderStage,
    ) -> AppResult<(OrderSettlement, ConfirmedOrderPayload)> {
        stage.transition_to(OrderStage::Settled)?;
        let settlement = self.calculator.settle(record);
        if settlement.has_warning(SettlementWarning::AmountOverflow) {
            return Err(AppError::Validation {
                errors: vec![ValidationError::new(
                    ErrorKind::InvalidValue,
                    "net_amount",
                    SettlementWarning::AmountOverflow.to_string(),
                )],
            });
        }
        for warning in &settlement.warnings {
            tracing::warn!(
                invoice = record.invoice_number.as_deref().unwrap_or_default(),
                "Settlement warning: {}",
                warning
            );
        }
        let payload = ConfirmedOrderPayload::from_settled(id, record, &settlement);
        Ok((settlement, payload))
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, call: F) -> AppResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        max_retries = self.retry.max_retries,
                        "Order store unavailable, retrying: {}",
                        err
                    );
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::order_store::StoredOrder;
    use rust_decimal::Decimal;
    use shared::{Commodity, OrderMeasurement, OtherDeduction};
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// In-memory store that fails the first `failures` calls before writing
    /// and loses the reply of the first `lost_replies` calls after writing
    #[derive(Clone, Default)]
    struct MemoryStore {
        rows: Arc<Mutex<Vec<(OrderSide, Uuid, ConfirmedOrderPayload)>>>,
        calls: Arc<AtomicU32>,
        failures: u32,
        lost_replies: u32,
        reject: bool,
    }

    impl MemoryStore {
        fn attempt(&self) -> AppResult<u32> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(AppError::PersistenceRejected {
                    status: 400,
                    message: "bad payload".into(),
                });
            }
            if call < self.failures {
                return Err(AppError::PersistenceUnavailable("connection reset".into()));
            }
            Ok(call)
        }
    }

    impl OrderStore for MemoryStore {
        async fn create(
            &self,
            side: OrderSide,
            payload: &ConfirmedOrderPayload,
        ) -> AppResult<StoredOrder> {
            let call = self.attempt()?;
            let mut rows = self.rows.lock().unwrap();
            match rows
                .iter_mut()
                .find(|(s, row_id, _)| *s == side && *row_id == payload.id)
            {
                Some(row) => row.2 = payload.clone(),
                None => rows.push((side, payload.id, payload.clone())),
            }
            if call < self.lost_replies {
                return Err(AppError::PersistenceUnavailable("reply timed out".into()));
            }
            Ok(StoredOrder {
                id: payload.id,
                created_at: None,
            })
        }

        async fn replace(
            &self,
            side: OrderSide,
            id: Uuid,
            payload: &ConfirmedOrderPayload,
        ) -> AppResult<StoredOrder> {
            self.attempt()?;
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|(s, row_id, _)| *s == side && *row_id == id)
                .ok_or_else(|| AppError::NotFound(format!("Confirmed order {}", id)))?;
            row.2 = payload.clone();
            Ok(StoredOrder { id, created_at: None })
        }
    }

    fn service(store: MemoryStore, max_retries: u32) -> SettlementService<MemoryStore> {
        SettlementService::new(
            Arc::new(SettlementCalculator::default()),
            store,
            RetryPolicy {
                max_retries,
                backoff: Duration::ZERO,
            },
        )
    }

    fn record() -> ConfirmedOrderRecord {
        ConfirmedOrderRecord {
            side: OrderSide::Sale,
            invoice_number: Some("INV-7".to_string()),
            vehicle_number: Some("pb 10 xy 4321".to_string()),
            commodity: Some(Commodity::Paddy),
            rate_per_mt: Some(dec("2500")),
            measurement: OrderMeasurement::from_weighbridge(dec("10.5"), dec("0.5")),
            other_deductions: vec![
                OtherDeduction::new(dec("300"), "short weight"),
                OtherDeduction::new(Decimal::ZERO, ""),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_preview_reports_errors_without_failing() {
        let svc = service(MemoryStore::default(), 0);
        let mut rec = record();
        rec.other_deductions.push(OtherDeduction::new(dec("100"), ""));

        let preview = svc.preview(rec);
        assert!(!preview.submittable);
        assert_eq!(preview.errors.len(), 1);
        assert_eq!(preview.errors[0].kind, ErrorKind::MissingRemark);
        assert_eq!(preview.settlement.total_deduction, dec("400"));
    }

    #[test]
    fn test_preview_reports_non_numeric_input() {
        let svc = service(MemoryStore::default(), 0);
        let form = OrderForm::from_json(
            r#"{
                "invoice_number": "INV-8",
                "vehicle_number": "MH12AB1234",
                "commodity": "maize",
                "rate_per_mt": "abc",
                "measurement": {"net_weight_mt": "4"}
            }"#,
        )
        .unwrap();

        let preview = svc.preview(form);
        assert!(!preview.submittable);
        assert_eq!(preview.errors.len(), 1);
        assert_eq!(preview.errors[0].kind, ErrorKind::InvalidValue);
        assert_eq!(preview.errors[0].field, "rate_per_mt");
        assert!(preview
            .settlement
            .has_warning(SettlementWarning::RateNotPositive));
    }

    #[tokio::test]
    async fn test_confirm_blocks_non_numeric_input() {
        let store = MemoryStore::default();
        let svc = service(store.clone(), 0);
        let mut form = OrderForm::from(record());
        form.input_errors.push(ValidationError::new(
            ErrorKind::InvalidValue,
            "quality.moisture",
            "Value must be a number",
        ));

        assert!(matches!(
            svc.confirm(form).await,
            Err(AppError::Validation { .. })
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_blocks_overflowing_amounts() {
        let store = MemoryStore::default();
        let svc = service(store.clone(), 0);
        let mut rec = record();
        rec.other_deductions = vec![
            OtherDeduction::new(Decimal::MAX, "penalty"),
            OtherDeduction::new(Decimal::MAX, "penalty"),
        ];

        match svc.confirm(rec).await {
            Err(AppError::Validation { errors }) => {
                assert_eq!(errors[0].kind, ErrorKind::InvalidValue);
            }
            other => panic!("unexpected result {:?}", other.map(|o| o.id)),
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_persists_payload() {
        let store = MemoryStore::default();
        let svc = service(store.clone(), 0);

        let confirmed = svc.confirm(record()).await.unwrap();
        assert_eq!(confirmed.stage, OrderStage::Persisted);
        assert_eq!(confirmed.settlement.net_amount, dec("24700"));

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        let (side, id, payload) = &rows[0];
        assert_eq!(*side, OrderSide::Sale);
        assert_eq!(*id, confirmed.id);
        assert_eq!(payload.other_deductions.len(), 1);
        assert_eq!(payload.vehicle_number.as_deref(), Some("PB10XY4321"));
    }

    #[tokio::test]
    async fn test_confirm_blocked_by_validation() {
        let store = MemoryStore::default();
        let svc = service(store.clone(), 0);
        let mut rec = record();
        rec.other_deductions = vec![OtherDeduction::new(dec("100"), "")];

        let err = svc.confirm(rec).await.unwrap_err();
        match err {
            AppError::Validation { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].kind, ErrorKind::MissingRemark);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_rejects_already_persisted() {
        let svc = service(MemoryStore::default(), 0);
        let mut rec = record();
        rec.stage = OrderStage::Persisted;
        assert!(matches!(svc.confirm(rec).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_network_failures_are_retried() {
        let store = MemoryStore {
            failures: 2,
            ..Default::default()
        };
        let svc = service(store.clone(), 2);

        assert!(svc.confirm(record()).await.is_ok());
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_after_lost_reply_keeps_one_order() {
        let store = MemoryStore {
            lost_replies: 1,
            ..Default::default()
        };
        let svc = service(store.clone(), 2);

        let confirmed = svc.confirm(record()).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, confirmed.id);
        assert_eq!(rows[0].2.id, confirmed.id);
    }

    #[tokio::test]
    async fn test_retries_give_up() {
        let store = MemoryStore {
            failures: 5,
            ..Default::default()
        };
        let svc = service(store.clone(), 1);

        let err = svc.confirm(record()).await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceUnavailable(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let store = MemoryStore {
            reject: true,
            ..Default::default()
        };
        let svc = service(store.clone(), 3);

        let err = svc.confirm(record()).await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceRejected { .. }));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_amend_replaces_settlement() {
        let store = MemoryStore::default();
        let svc = service(store.clone(), 0);

        tokio_test::block_on(async {
            let confirmed = svc.confirm(record()).await.unwrap();

            let mut changed = record();
            changed.rate_per_mt = Some(dec("2600"));
            let amended = svc.amend(confirmed.id, changed).await.unwrap();

            assert_eq!(amended.id, confirmed.id);
            assert_eq!(amended.settlement.gross_amount, dec("26000"));
            let rows = store.rows.lock().unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].2.net_amount, dec("25700"));
        });
    }

    #[test]
    fn test_amend_unknown_order() {
        let svc = service(MemoryStore::default(), 0);
        let result = tokio_test::block_on(svc.amend(Uuid::new_v4(), record()));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

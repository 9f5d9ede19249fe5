//! Part ordering and cashier decisions

use std::collections::HashMap;
use std::sync::Arc;

use sc_contracts::part_orders::{check_order_pending, OrderPartsContract};
use sc_contracts::{authorize, permissions, Actor, Contract};
use sc_core::{Clock, ScError, ScResult};
use sc_db::{JobCardStore, OrderDecision, OrderInsert, PartOrderStore};
use sc_models::{IdCategory, OrderLine, OrderStatus, PartOrder, ServiceRecordStatus};

use crate::identifiers::IdentifierAllocator;

#[derive(Clone)]
pub struct PartOrderService {
    orders: Arc<dyn PartOrderStore>,
    job_cards: Arc<dyn JobCardStore>,
    ids: IdentifierAllocator,
    clock: Arc<dyn Clock>,
}

impl PartOrderService {
    pub fn new(
        orders: Arc<dyn PartOrderStore>,
        job_cards: Arc<dyn JobCardStore>,
        ids: IdentifierAllocator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            job_cards,
            ids,
            clock,
        }
    }

    /// Raise an order for parts against open service records of a card
    pub async fn order_parts(
        &self,
        actor: &dyn Actor,
        job_card_id: &str,
        lines: Vec<OrderLine>,
    ) -> ScResult<PartOrder> {
        authorize(actor, permissions::ORDER_PARTS, "order parts")?;

        if self.job_cards.find_job_card(job_card_id).await?.is_none() {
            return Err(ScError::not_found("JobCard", job_card_id));
        }

        let mut records = HashMap::new();
        for line in &lines {
            if records.contains_key(&line.service_record_id) {
                continue;
            }
            if let Some(record) = self.job_cards.find_service_record(line.service_record_id).await? {
                records.insert(record.id, record);
            }
        }
        OrderPartsContract::new(job_card_id, &records).validate(lines.as_slice())?;

        let id = self.ids.allocate(IdCategory::Order).await?;
        let order = PartOrder {
            id: id.into_string(),
            job_card_id: job_card_id.to_string(),
            requested_by: actor.id().to_string(),
            status: OrderStatus::Sent,
            order_date: self.clock.now(),
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            lines: lines
                .into_iter()
                .map(|line| OrderLine {
                    part_id: line.part_id.trim().to_string(),
                    ..line
                })
                .collect(),
        };
        if let OrderInsert::RecordClosed(record_id) = self.orders.insert_order(&order).await? {
            return Err(ScError::invalid_state(
                "ServiceRecord",
                record_id,
                ServiceRecordStatus::Finished,
                "service record was finished before the order was stored",
            ));
        }

        tracing::info!(
            order_id = %order.id,
            job_card_id = %job_card_id,
            lines = order.lines.len(),
            requested_by = %actor.id(),
            "part order sent"
        );
        Ok(order)
    }

    pub async fn approve_order(&self, actor: &dyn Actor, order_id: &str) -> ScResult<PartOrder> {
        self.decide(actor, order_id, OrderDecision::Approve).await
    }

    pub async fn reject_order(&self, actor: &dyn Actor, order_id: &str) -> ScResult<PartOrder> {
        self.decide(actor, order_id, OrderDecision::Reject).await
    }

    pub async fn find_order(&self, order_id: &str) -> ScResult<PartOrder> {
        self.orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| ScError::not_found("PartOrder", order_id))
    }

    async fn decide(
        &self,
        actor: &dyn Actor,
        order_id: &str,
        decision: OrderDecision,
    ) -> ScResult<PartOrder> {
        authorize(actor, permissions::DECIDE_ORDER, "approve or reject orders")?;

        let order = self.find_order(order_id).await?;
        check_order_pending(&order)?;

        let decided = self
            .orders
            .decide_order(order_id, decision, actor.id(), self.clock.now())
            .await?;
        let decided = match decided {
            Some(order) => order,
            None => {
                // Another cashier settled it between the read and the write
                let current = self.find_order(order_id).await?;
                check_order_pending(&current)?;
                return Err(ScError::invalid_state(
                    "PartOrder",
                    order_id,
                    current.status,
                    "order could not be settled",
                ));
            }
        };

        tracing::info!(
            order_id = %order_id,
            status = %decided.status,
            cashier = %actor.id(),
            "part order settled"
        );
        Ok(decided)
    }
}

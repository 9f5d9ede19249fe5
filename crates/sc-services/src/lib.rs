//! # sc-services
//!
//! Business logic services for Service Center RS.
//!
//! Each service checks the actor's role, validates through a contract, and
//! only then writes through its store. Services hold their stores as trait
//! objects so the same code runs against PostgreSQL and the in-memory store.

pub mod identifiers;
pub mod customers;
pub mod staff;
pub mod job_cards;
pub mod part_orders;
pub mod breakdowns;

use std::sync::Arc;

use sc_core::config::WorkflowConfig;
use sc_core::Clock;
use sc_db::{
    BreakdownStore, CustomerStore, Database, JobCardStore, MemoryStore, PartOrderStore,
    PgBreakdownStore, PgCustomerStore, PgJobCardStore, PgPartOrderStore, PgSequenceStore,
    PgStaffStore, SequenceStore, StaffStore,
};
use sc_notifications::{
    MemoryNotificationStore, NotificationStore, Notifier, PgNotificationStore, PushSender,
};

pub use breakdowns::{BreakdownService, InvoiceRequest, IssuedInvoice};
pub use customers::CustomerService;
pub use identifiers::IdentifierAllocator;
pub use job_cards::{JobCardAssignment, JobCardService, OpenedJobCard};
pub use part_orders::PartOrderService;
pub use staff::StaffService;

/// Store handles the services are built from
#[derive(Clone)]
pub struct Stores {
    pub sequences: Arc<dyn SequenceStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub staff: Arc<dyn StaffStore>,
    pub job_cards: Arc<dyn JobCardStore>,
    pub part_orders: Arc<dyn PartOrderStore>,
    pub breakdowns: Arc<dyn BreakdownStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    /// PostgreSQL stores sharing one pool
    pub fn postgres(database: &Database) -> Self {
        let pool = database.pool().clone();
        Self {
            sequences: Arc::new(PgSequenceStore::new(pool.clone())),
            customers: Arc::new(PgCustomerStore::new(pool.clone())),
            staff: Arc::new(PgStaffStore::new(pool.clone())),
            job_cards: Arc::new(PgJobCardStore::new(pool.clone())),
            part_orders: Arc::new(PgPartOrderStore::new(pool.clone())),
            breakdowns: Arc::new(PgBreakdownStore::new(pool.clone())),
            notifications: Arc::new(PgNotificationStore::new(pool)),
        }
    }

    /// Every store backed by one in-memory instance
    pub fn memory(store: Arc<MemoryStore>, notifications: Arc<MemoryNotificationStore>) -> Self {
        Self {
            sequences: store.clone(),
            customers: store.clone(),
            staff: store.clone(),
            job_cards: store.clone(),
            part_orders: store.clone(),
            breakdowns: store,
            notifications,
        }
    }
}

/// All services, wired to the same stores and clock
#[derive(Clone)]
pub struct Services {
    pub ids: IdentifierAllocator,
    pub customers: CustomerService,
    pub staff: StaffService,
    pub job_cards: JobCardService,
    pub part_orders: PartOrderService,
    pub breakdowns: BreakdownService,
}

impl Services {
    pub fn new(
        stores: Stores,
        push: Arc<dyn PushSender>,
        clock: Arc<dyn Clock>,
        workflow: &WorkflowConfig,
    ) -> Self {
        let ids = IdentifierAllocator::new(stores.sequences.clone());
        let notifier = Notifier::new(stores.notifications.clone(), push);

        Self {
            customers: CustomerService::new(stores.customers.clone(), ids.clone(), clock.clone()),
            staff: StaffService::new(stores.staff.clone(), ids.clone(), clock.clone()),
            job_cards: JobCardService::new(
                stores.job_cards.clone(),
                stores.staff.clone(),
                stores.customers.clone(),
                ids.clone(),
                clock.clone(),
            )
            .with_strict_transitions(workflow.strict_transitions),
            part_orders: PartOrderService::new(
                stores.part_orders.clone(),
                stores.job_cards.clone(),
                ids.clone(),
                clock.clone(),
            ),
            breakdowns: BreakdownService::new(
                stores.breakdowns.clone(),
                ids.clone(),
                notifier,
                clock,
                workflow.breakdown_service_id.clone(),
            ),
            ids,
        }
    }
}

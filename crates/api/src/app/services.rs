//! Process wiring: engine, loan orchestrator, collaborators, movement bus.

use std::sync::Arc;

use toolrent_core::{Clock, DomainResult, SystemClock};
use toolrent_events::InMemoryEventBus;
use toolrent_infra::{BorrowerDirectory, LocalInventoryGateway, RuntimeSettings};
use toolrent_inventory::{InMemoryBucketStore, InventoryBucketEngine, MovementRecord, PublishingAuditLog};
use toolrent_loans::{InMemoryLoanStore, LoanLifecycleOrchestrator, LoanQueries, LoanSettings};

pub type Engine = InventoryBucketEngine<InMemoryBucketStore>;
pub type Loans = LoanLifecycleOrchestrator<Arc<InMemoryLoanStore>, LocalInventoryGateway<InMemoryBucketStore>>;
pub type MovementBus = InMemoryEventBus<MovementRecord>;
pub type Queries<'a> = LoanQueries<&'a Arc<InMemoryLoanStore>>;

pub struct AppServices {
    pub inventory: Arc<Engine>,
    pub loans: Loans,
    pub settings: Arc<RuntimeSettings>,
    pub movements: Arc<MovementBus>,
}

impl AppServices {
    /// In-memory wiring: every store lives in this process.
    pub fn in_memory(settings: LoanSettings) -> DomainResult<Self> {
        Self::in_memory_with_clock(settings, Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(settings: LoanSettings, clock: Arc<dyn Clock>) -> DomainResult<Self> {
        let settings = Arc::new(RuntimeSettings::new(settings)?);
        let movements = Arc::new(MovementBus::new());

        let inventory = Arc::new(
            InventoryBucketEngine::new(
                InMemoryBucketStore::new(),
                Arc::new(PublishingAuditLog::new(movements.clone())),
            )
            .with_clock(clock.clone()),
        );

        let loan_store = Arc::new(InMemoryLoanStore::new());
        let directory = BorrowerDirectory::new(Arc::new(LoanQueries::new(loan_store.clone(), clock.clone())));

        let loans = LoanLifecycleOrchestrator::new(
            loan_store,
            LocalInventoryGateway::new(inventory.clone()),
            Arc::new(directory),
            settings.clone(),
        )
        .with_clock(clock);

        Ok(Self {
            inventory,
            loans,
            settings,
            movements,
        })
    }
}

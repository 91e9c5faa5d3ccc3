//! `toolrent-loans`: loan lifecycle on top of the bucket inventory.
//!
//! The orchestrator owns the Loan state machine (Open -> Closed, plus the
//! independent fine-paid flags) and drives inventory through the
//! [`InventoryCollaborator`] contract, one unit move per loan item.

pub mod collaborators;
pub mod collision;
pub mod fines;
pub mod loan;
pub mod orchestrator;
pub mod queries;
pub mod request;
pub mod store;

pub use collaborators::{
    AlwaysActive, BorrowerStanding, ConfigCollaborator, IdentityCollaborator, InventoryCollaborator, LoanSettings,
    StandingSource, ToolSnapshot,
};
pub use collision::CollisionGuard;
pub use fines::{FineCalculator, ReturnCondition};
pub use loan::{Loan, LoanItem, LoanStatus};
pub use orchestrator::LoanLifecycleOrchestrator;
pub use queries::{DebtFilter, LoanQueries};
pub use request::{CreateLoan, LoanItemRequest, PayFines, ReturnLoan, ValidatedLoan};
pub use store::{InMemoryLoanStore, LoanStore};

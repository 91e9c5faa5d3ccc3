//! Infrastructure layer: collaborator glue, runtime settings, config, workers.
//!
//! Everything here connects the domain crates to each other and to the
//! process: the in-process inventory gateway, the borrower directory, the
//! mutable settings service and the movement worker.

pub mod config;
pub mod gateway;
pub mod identity;
pub mod settings;
pub mod worker;

pub use config::AppConfig;
pub use gateway::LocalInventoryGateway;
pub use identity::BorrowerDirectory;
pub use settings::RuntimeSettings;
pub use worker::{MovementWorker, WorkerHandle};

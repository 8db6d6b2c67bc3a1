pub mod gateway;
pub mod reconciliation;
pub mod token_store;
pub mod validator;

pub use gateway::WebposGateway;
pub use reconciliation::{EngineError, ReconcileOutcome, ReconciliationEngine};
pub use token_store::CallbackTokenStore;
pub use validator::{CallbackError, CallbackValidator};

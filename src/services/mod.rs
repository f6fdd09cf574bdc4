// Service exports
pub mod backend;
pub mod postgres;
pub mod throttle_store;

pub use backend::{AuthSession, BackendClient, BackendError, BackendTables};
pub use postgres::{PostgresClient, PostgresError, ScoreRecord};
pub use throttle_store::{StoreError, ThrottleKey, ThrottleRegistry};

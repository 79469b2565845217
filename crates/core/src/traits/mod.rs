pub mod task_executor;
pub mod transport;

pub use task_executor::MigrationExecutor;
pub use transport::{CommandOutput, MirrorTransport, TransferOperation, TransferRequest};

pub mod traits;

pub use traits::{CommandOutput, MigrationExecutor, MirrorTransport, TransferOperation, TransferRequest};

pub use migrator_errors::{MigratorError, MigratorResult};

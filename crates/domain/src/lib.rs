pub mod entities;
pub mod results;
pub mod value_objects;

pub use entities::*;
pub use migrator_errors::{MigratorError, MigratorResult};
pub use results::*;
pub use value_objects::*;

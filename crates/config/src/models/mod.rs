pub mod app_config;
pub mod batch;
pub mod catalog;
pub mod logging;
pub mod transfer;

pub use app_config::*;
pub use batch::*;
pub use catalog::*;
pub use logging::*;
pub use transfer::*;

pub mod app;
pub mod report;

pub use app::MigrationApp;

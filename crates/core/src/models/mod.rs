pub mod history;
pub mod holding;
pub mod metrics;
pub mod price;
pub mod report;
pub mod settings;

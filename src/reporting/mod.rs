//! Reporting core: facade over resolver + aggregator, and pagination helpers

pub mod facade;
pub mod pagination;

pub use facade::{mining_volume_filter, ManagerVolume, PerformerMetric, ReportingFacade, TopPerformer};
pub use pagination::{Page, PageRequest, SortDirection};

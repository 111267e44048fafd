mod audit;
mod lifetime;

pub use audit::IndexAuditSystem;
pub use lifetime::LifetimeSystem;

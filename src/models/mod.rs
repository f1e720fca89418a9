mod audit_log;
mod customer;
mod order;

pub use audit_log::*;
pub use customer::*;
pub use order::*;

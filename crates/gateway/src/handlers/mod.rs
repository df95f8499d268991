//! API handlers module

pub mod books;
pub mod health;
pub mod metrics;

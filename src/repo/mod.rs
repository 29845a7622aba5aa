//! Query layer: one module per table group, plain functions over the
//! pool. Handlers never write SQL themselves.

pub mod categories;
pub mod orders;
pub mod products;
pub mod reports;
pub mod users;

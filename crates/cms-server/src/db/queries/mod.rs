//! SQL for each table group. Functions take the pool and return
//! `AppResult` so handlers and services can propagate with `?`.

pub mod blueprint;
pub mod form;
pub mod lead;
pub mod metrics;
pub mod page;
pub mod property;

//! Terminal rendering of analytics records

pub mod compare;
pub mod correlate;
pub mod quota;
pub mod search;
pub mod setup;
pub mod ui;

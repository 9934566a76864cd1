//! Lost & Found Claims - claim verification workflow for the campus portal

pub mod api;
pub mod claim;
pub mod core;
pub mod matching;
pub mod questions;
pub mod session;

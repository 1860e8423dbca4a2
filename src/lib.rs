pub mod calendar;
pub mod config;
pub mod error;
pub mod filter;
pub mod form;
pub mod models;
pub mod routes;
pub mod schedule;
pub mod store;

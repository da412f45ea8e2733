pub mod auth;
pub mod calendar;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod edit;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod store;

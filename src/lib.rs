pub mod api_connection;
pub mod cli;
pub mod config;
pub mod errors;
pub mod goals;
pub mod meal_aggregator;
pub mod models;
pub mod search;
pub mod store;
pub mod unit_scaler;

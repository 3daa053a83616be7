pub mod accounts;
pub mod manager;
pub mod models;
pub mod persons;
pub mod schema;

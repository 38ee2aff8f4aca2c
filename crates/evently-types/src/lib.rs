//! Types shared between the Evently API handlers, the database layer and clients.

pub mod api;
pub mod models;
pub mod routes;

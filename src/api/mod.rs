//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /cache/:tier/:key` - Store a value in a tier
//! - `GET /cache/:tier/:key` - Retrieve a value from a tier
//! - `DELETE /cache/:tier/:key` - Delete a key from a tier
//! - `DELETE /cache/:tier` - Clear a tier
//! - `DELETE /cache` - Clear every tier
//! - `POST /invalidate` - Delete keys matching a wildcard pattern
//! - `GET /stats/:tier` - Get tier statistics
//! - `GET /stats` - Get totals across every tier
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

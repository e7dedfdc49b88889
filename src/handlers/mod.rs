// handlers/mod.rs - HTTP handlers
//
// Public:    /, /health
// Protected: /me, /trips/** (bearer token resolved by middleware::require_identity)
//
// Handlers only extract request parts and delegate to the resource
// managers in crate::services; errors convert into ApiError.
pub mod events;
pub mod system;
pub mod tasks;
pub mod trips;

//! Wire types shared by the Voca crates: REST request/response bodies,
//! token claims, domain models and real-time gateway events.

pub mod api;
pub mod events;
pub mod models;

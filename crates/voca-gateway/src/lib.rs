//! Real-time push channel. Unauthenticated and outside the token chain:
//! clients get a greeting on connect and every stored message afterwards.

pub mod connection;
pub mod dispatcher;

//! Real-time chat relay.
//!
//! Clients join numbered rooms over WebSocket; every message sent to a room
//! is fanned out to its current members through a single hub control loop.
//! Members that cannot keep up are evicted instead of slowing the room down.

// layers
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

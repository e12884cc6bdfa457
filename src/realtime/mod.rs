//! The real-time core: connection registry, fanout dispatcher, wire events,
//! and the WebSocket session handlers.

pub mod dispatcher;
pub mod events;
pub mod registry;
pub mod socket;

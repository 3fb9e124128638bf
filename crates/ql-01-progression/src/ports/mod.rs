//! Ports layer: the API the engine offers and the dependencies it consumes.

pub mod inbound;
pub mod outbound;

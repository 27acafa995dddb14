//! Message protocol between the detector, the coordinator and the panel.
//!
//! Requests are a tagged enum dispatched with an exhaustive `match`; every
//! request yields exactly one [`Response`]. Broadcasts are fire-and-forget.

mod broadcast;
mod channel;
mod message;

pub use broadcast::{Broadcast, BroadcastBus, SelectionUpdate};
pub use channel::{MessageSender, RuntimeChannel};
pub use message::{AckResponse, OpenClaireRequest, PingResponse, Request, Response};

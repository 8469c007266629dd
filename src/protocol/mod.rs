// src/protocol/mod.rs
// Message codec and origin validator (C1)

pub mod codec;
pub mod message;
pub mod origin;

pub use codec::{classify, Classified};
pub use message::{ActionMessage, ActionResult, LinkTarget, NotifyLevel};
pub use origin::{classify_origin, OriginVerdict};

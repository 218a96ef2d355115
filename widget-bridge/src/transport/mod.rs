//! Transport to guest surfaces
//!
//! The isolation primitive (iframe, webview, worker) is given; the bridge only
//! needs a way to hand it opaque structured messages.

pub mod channel;

pub use channel::{ChannelPort, GuestChannel};

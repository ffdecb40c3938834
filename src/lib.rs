//! nav-session: coordination core of a turn-by-turn navigation session
//!
//! Decides which position source feeds the route tracker (organic, or a
//! simulated walk along the route when the signal stays poor), relays
//! tracker lifecycle notifications to the application, and dispatches
//! spoken instructions to a speech backend.
//!
//! All state is owned by one task ([`NavigationSession::run`]); the
//! application drives it through a cloneable [`SessionHandle`] and observes
//! it through the [`NavigationEvent`] broadcast.

pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod location;
pub mod relay;
pub mod replay;
pub mod route;
pub mod session;
pub mod timer;
pub mod voice;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Capabilities, SessionConfig};
pub use error::{NavError, ReroutingError, Result};
pub use events::NavigationEvent;
pub use session::{Collaborators, NavigationSession, SessionHandle, SessionStatus};

//! # medleycontrol - combined media-controller aggregation
//!
//! One media application may be controllable through several backends at
//! once: a platform media-session bridge, a vendor remote-control SDK, or
//! nothing at all for a while. Each backend connects out-of-band and may
//! never connect, connect late, support only part of the capability set,
//! or fail transiently per call.
//!
//! [`CombinedController`] hides all of that behind a single
//! [`MediaController`]: it holds one [`PendingConnection`] per backend,
//! runs commands against the first connected backend that supports them,
//! waits a bounded time for connections before browse/search discovery,
//! pins the backend that produced results for follow-up drill-downs, and
//! cancels superseded discovery work.

pub mod combined;
pub mod connection;
pub mod controller;
pub mod errors;

pub use combined::{CombinedController, CONNECTION_TIMEOUT};
pub use connection::{ConnectionState, PendingConnection, ResolveCallback};
pub use controller::{ControllerCallback, MediaConnector, MediaController};
pub use errors::{ControllerError, Result};

//! Long-running processors.
//!
//! - `NewAddressDetector` diffs the registry against the stored window
//! - `DetectionScheduler` drives detection cycles without overlap
//! - `NotificationDispatcher` delivers alerts through the circuit breaker
//! - `SwapWaiter` polls for the initial swap of a pair
//! - `ReconnectSupervisor` restarts the chat transport on transport errors

pub mod detector;
pub mod dispatcher;
pub mod reconnect;
pub mod scheduler;
pub mod swap_wait;

pub use detector::{CheckOutcome, DetectorParts, NewAddressDetector};
pub use dispatcher::{Delivery, NotificationDispatcher, NotifyError};
pub use reconnect::{ReconnectOutcome, ReconnectSupervisor};
pub use scheduler::DetectionScheduler;
pub use swap_wait::{SwapWaitSession, SwapWaitState, SwapWaiter};

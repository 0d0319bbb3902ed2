//! Stream combinators used by subscriptions

pub mod throttle;

pub use throttle::{Throttle, ThrottleExt};

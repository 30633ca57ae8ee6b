//! Application Layer - Use cases over an injected price panel

pub mod session;

pub use session::{AnalyticsSession, SessionError};

//! Plain data types shared between the build tracker, its sinks and the agent daemon.

mod domain;
pub use domain::*;

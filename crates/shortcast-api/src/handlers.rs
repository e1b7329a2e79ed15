//! Request handlers.

pub mod health;
pub mod podcasts;

pub use health::*;
pub use podcasts::*;

//! HTTP request handlers.

pub mod health;
pub mod manifest;
pub mod params;
pub mod publish;

pub use health::*;
pub use manifest::*;
pub use publish::*;

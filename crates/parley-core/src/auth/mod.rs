//! Authentication port and the controller that owns the current identity.

pub mod controller;
pub mod events;
pub mod gateway;
pub mod validate;

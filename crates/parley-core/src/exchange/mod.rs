//! Message exchange: input classification, reply generation, and the
//! pipeline that turns user input into a persisted user/assistant pair.

pub mod classify;
pub mod pipeline;
pub mod responder;

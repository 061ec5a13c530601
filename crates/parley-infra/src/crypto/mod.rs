//! Cryptographic primitives for Parley.

pub mod password;

#![forbid(unsafe_code)]

pub mod gateway;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;

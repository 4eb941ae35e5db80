#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod courier;
pub mod credit;
pub mod entities;
pub mod events;
pub mod framework;
pub mod gateway;
pub mod otp;
pub mod processors;
pub mod workflow;

//! HTTP API surface: customer endpoints, staff console, inbound webhooks.

pub mod admin;
pub mod customer;
pub mod extractors;
pub mod webhook;

//! Integrations with services outside this process

pub mod integrations;

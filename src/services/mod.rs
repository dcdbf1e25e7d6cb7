//! Services Layer
//!
//! Business logic extracted from HTTP handlers. Every function takes the
//! caller's `ActorContext` explicitly where identity matters.

pub mod catalog_service;
pub mod counter_service;
pub mod goal_service;
pub mod library_service;
pub mod profile_service;
pub mod quote_service;
pub mod ranking_service;
pub mod review_service;

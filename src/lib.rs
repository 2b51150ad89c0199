//! Registration Flows - Multi-turn record registration over chat
//!
//! This crate implements a generic engine that collects a record's fields
//! over several chat turns, creates the record through an external API, and
//! lets the user edit or delete it afterwards.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

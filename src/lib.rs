// src/lib.rs

//! Place Explorer Library
//!
//! Search a catalog of places, mark them visited against a remote ledger,
//! track XP and milestones, and keep a map surface in step.

pub mod engine;
pub mod error;
pub mod map;
pub mod models;
pub mod notify;
pub mod runtime;
pub mod services;

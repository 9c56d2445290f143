//! Core type definitions.

pub mod claim_code;
pub mod id;
pub mod status;

//! # utils
//!
//! Utilities

pub mod smb;

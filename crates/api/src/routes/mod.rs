//! Route handlers

pub mod alarm;
pub mod lifecycle;
pub mod status;

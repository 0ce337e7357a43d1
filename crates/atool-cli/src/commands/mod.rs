//! Command implementations.

pub mod build;
pub mod check;

pub use build::execute as build_execute;
pub use check::execute as check_execute;

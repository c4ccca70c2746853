//! Domain data types

pub mod credentials;
pub mod failure;
pub mod report;

pub use credentials::*;
pub use failure::*;
pub use report::*;

//! Application services for dialogue graphs.

pub mod script;

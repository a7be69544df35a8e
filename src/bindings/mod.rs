//! Python extension entry points (feature `python`).
pub mod python;

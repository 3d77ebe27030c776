//! Common scalar types used by the bez autohinter.
//!
//! Coordinates are carried as 24.8 [`Fixed`] values in design space.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod bbox;
mod fixed;
mod point;

#[cfg(all(test, feature = "serde"))]
mod serde_test;

pub use bbox::BoundingBox;
pub use fixed::Fixed;
pub use point::Point;

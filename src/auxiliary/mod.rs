//! Helper items to assist the working of spinspg.

pub mod cell;
pub mod geometry;
pub mod hermite;

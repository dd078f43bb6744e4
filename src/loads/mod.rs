//! Load types

mod load_case;

pub use load_case::{ConcentratedLoad, LoadCase};

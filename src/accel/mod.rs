//! Scene-geometry acceleration (C5 §4.5): a kd-tree over primitive bounds,
//! itself exposed as a `Primitive` so `Scene` holds a single aggregate.

pub mod kdtree;

pub use kdtree::{KdTreeAccel, KdTreeStats};

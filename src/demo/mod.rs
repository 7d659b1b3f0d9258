//! Demo application served behind the capture layer.

pub mod colors;

pub use colors::{routes, Color, ColorStore, InMemoryColorStore, SharedStore};

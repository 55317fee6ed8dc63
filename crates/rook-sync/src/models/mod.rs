//! ROOK API response models

pub mod rook;

pub use rook::*;

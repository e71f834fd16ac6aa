//! Link pipeline driver

mod linker;

pub use linker::{LinkOptions, LinkedProgram, Linker};

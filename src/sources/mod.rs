//! Byte source implementations

pub mod reader;
pub mod simulated;

pub use reader::ReaderSource;
pub use simulated::SimulatedLink;

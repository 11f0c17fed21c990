pub mod maps;
pub mod source;

pub use maps::MapsParseError;
pub use source::{ProcfsOpenError, ProcfsSource};

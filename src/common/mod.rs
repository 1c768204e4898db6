pub mod build_info;
pub mod errors;
pub mod logger;
pub mod types;

pub use build_info::*;
pub use errors::*;
pub use logger::*;
pub use types::*;

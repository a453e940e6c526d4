pub mod classification;
pub mod constructors;
pub mod types;

pub use constructors::*;
pub use types::{Error, Kind, Result};

pub type HttpError = Error;

pub use constructors::BoxError;

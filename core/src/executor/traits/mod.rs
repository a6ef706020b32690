pub mod collaborator;
pub mod executor;
pub mod observer;
pub mod runtime;

pub use collaborator::*;
pub use executor::*;
pub use observer::*;
pub use runtime::*;

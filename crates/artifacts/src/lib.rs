pub mod decimal;
pub mod importance;
pub mod scalar;
pub mod schema;
pub mod store;

pub use importance::*;
pub use scalar::*;
pub use schema::*;
pub use store::*;

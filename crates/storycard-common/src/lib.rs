pub mod coord;
pub mod range;
pub mod value;

pub use coord::*;
pub use range::*;
pub use value::*;

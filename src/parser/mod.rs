pub mod record;
pub mod tabular;

pub use record::*;
pub use tabular::*;

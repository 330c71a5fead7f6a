pub mod issue;
pub mod field;
pub mod record;
pub mod search;

pub use issue::*;
pub use field::*;
pub use record::*;
pub use search::*;

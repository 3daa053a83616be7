pub mod collection;
pub mod record;

pub use collection::{create, list};
pub use record::{delete, get, patch, put};

pub mod collection;
pub mod model;
pub mod util;

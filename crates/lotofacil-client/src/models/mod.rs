pub mod draw;
pub mod schema;

pub use draw::{Draw, DrawError};

pub mod common;
pub mod latest_draw;
pub mod specified_draw;

//! Storage layer implementation
//!
//! One fixed-stride binary file per table.

pub mod codec;
pub mod cursor;
pub mod render;
pub mod table;

pub use cursor::Cursor;
pub use render::column_width;
pub use table::Table;

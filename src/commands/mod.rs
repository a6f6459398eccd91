pub mod permissions;
pub mod screen;

pub use permissions::*;
pub use screen::*;

mod input;
mod menu;
mod render;
mod types;

pub use input::*;
pub use menu::*;
pub use render::*;
pub use types::*;

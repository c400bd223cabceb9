pub mod dispatch;
mod render;
pub mod status;
mod style;

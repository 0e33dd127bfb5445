pub mod terminal;
pub mod window;

pub mod canvas;
pub mod display;
pub mod event;
pub mod flip;
pub mod link;
pub mod screen;

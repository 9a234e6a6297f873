pub mod app;
pub mod canvas;
pub mod config;
pub mod input;
pub mod logging;
pub mod render;
pub mod scheduler;
pub mod starfield;
pub mod terminal;

pub mod commands;
pub mod directory;
pub mod http;
pub mod memory;
pub mod model;
pub mod setters;
pub mod steps;

pub mod config;
pub mod controller;
pub mod framework;
pub mod plugins;

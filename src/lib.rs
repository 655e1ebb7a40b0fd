pub mod adapters;
pub mod application;
pub mod config;
pub mod console;
pub mod domain;
pub mod ports;

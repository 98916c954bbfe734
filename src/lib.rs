pub mod config;
pub mod db;
pub mod device;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod utils;

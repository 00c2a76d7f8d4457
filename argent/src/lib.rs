pub mod advisor;
pub mod cache;
pub mod domain;
pub mod planes;
pub mod ports;

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod http;
pub mod payments;
pub mod repositories;
pub mod scheduler;

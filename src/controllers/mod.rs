pub mod account;
pub mod health;
pub mod payment;
pub mod webhook;

pub mod access;
pub mod auth;
pub mod notification;
pub mod profile;
pub mod reminder;
pub mod shared;
pub mod subscription;
pub mod webhook;

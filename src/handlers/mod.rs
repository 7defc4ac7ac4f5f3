// src/handlers/mod.rs

pub mod auth;
pub mod engagement;
pub mod feed;
pub mod posts;
pub mod profile;
pub mod social;
pub mod tags;
pub mod users;

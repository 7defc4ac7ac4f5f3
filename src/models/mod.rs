// src/models/mod.rs

pub mod comment;
pub mod params;
pub mod post;
pub mod tag;
pub mod user;

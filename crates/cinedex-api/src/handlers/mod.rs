//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod genres;
pub mod health;
pub mod movies;
pub mod params;
pub mod reviews;
pub mod users;

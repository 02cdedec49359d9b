//! Sonoscore library - camera frame to edge score to sonified players

pub mod audio;
pub mod camera;
pub mod cli;
pub mod collision;
pub mod error;
pub mod messages;
pub mod params;
pub mod player;
pub mod rendering;
pub mod score;
pub mod session;

//! API route handlers

pub mod calibrate;
pub mod frames;
pub mod history;
pub mod navigation;
pub mod query;
pub mod scene;
pub mod voice;

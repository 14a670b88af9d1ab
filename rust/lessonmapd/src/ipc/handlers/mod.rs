pub mod core;
pub mod courses;
pub mod map;
pub mod profile;
pub mod setup;
pub mod viewport;

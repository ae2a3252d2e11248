// Armrest shared type definitions
// Each submodule defines types used across the application.

pub mod bookmark;
pub mod daily;
pub mod errors;
pub mod settings;
pub mod storage;
pub mod theme;
pub mod website;

// Armrest state managers
// Managers own a persisted user document and its CRUD operations.

pub mod bookmark_manager;

pub mod controller;
pub mod diagnostics;
pub mod page;
pub mod planner;
pub mod render;
pub mod session_manager;
pub mod transcript;

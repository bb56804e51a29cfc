pub mod browser_handlers;
pub mod health_handlers;

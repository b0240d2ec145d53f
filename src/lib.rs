// Library root. Exposes the config resolver, pricing service and router to
// integration tests. The binary entry point is src/main.rs.

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod pricing;
pub mod settings;

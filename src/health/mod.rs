mod server;

pub use server::{routes, spawn_health_server};

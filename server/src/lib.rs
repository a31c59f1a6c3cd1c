pub mod config;
pub mod http;
pub mod session;

pub use config::Config;
pub use session::SessionService;

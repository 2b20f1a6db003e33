// Library surface for headless/integration tests and reuse.
// The binary in main.rs only parses flags, sets up logging and wires stdin/stdout.
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod input;
pub mod question;
pub mod scores;
pub mod session;
pub mod util;

pub use config::Config;
pub use controller::SessionController;
pub use error::{Error, Result};

pub mod config;
pub mod error;
pub mod file;

pub use config::{Config, load_dotenv};
pub use error::*;
pub use file::{FileBuffer, load_file};

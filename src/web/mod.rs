pub mod server;
pub mod api;
pub mod state;
pub mod validation;

pub use server::*;
pub use state::*;
pub use validation::parse_features;

pub mod error;
pub mod generator;
mod memory;
pub mod model;
mod pg;
pub mod service;
pub mod store;

pub use error::GameError;
pub use memory::MemoryGameStore;
pub use pg::PgGameStore;
pub use service::{CreateSessionInput, GameService, GameTunables, SubmitAnswerInput};

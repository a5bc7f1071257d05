pub mod baseline;
pub mod catalog;
pub mod config;
pub mod ctx;
pub mod differential;
pub mod engine;
pub mod input;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod schema;
pub mod scores;
pub mod trajectory;

pub use engine::Engine;

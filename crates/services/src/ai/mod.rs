pub mod client;
pub mod collaborators;
pub mod config;

pub use client::ChatClient;
pub use collaborators::{ChatModel, CourseGenerator, CourseVerifier, Remediator};
pub use config::AiConfig;

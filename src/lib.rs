//! Animal story generator - an HTTP service that writes short stories about
//! an animal and illustrates each one
//!
//! A language model writes the stories, an image model draws one picture per
//! story, and the results are returned as a single HTML page. Image failures
//! are contained to their own story.

pub mod ai;
pub mod app;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod render;

pub use error::{Error, Result};

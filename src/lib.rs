pub mod backend;
pub mod cli;
pub mod color;
pub mod config;
pub mod notes;
pub mod repo;
pub mod router;
pub mod template;
pub mod types;

// Re-export commonly used types
pub use color::{ColorError, ColorName};
pub use router::{CaptureError, CardDefaults, IdeaRouter, Outcome};
pub use types::{CaptureRequest, Destination, Idea, IssueOptions};

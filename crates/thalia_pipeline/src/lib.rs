//! Response generation: prompt assembly, output cleaning, validation,
//! bounded retries, and the canned fallback that makes the whole path
//! infallible from the caller's point of view.

pub mod pipeline;
pub mod request;
pub mod sanitize;
pub mod validate;

pub use pipeline::ResponseGenerationPipeline;
pub use request::{GenerationInput, OutputKind};
pub use sanitize::{sanitize, truncate_at_sentence};
pub use validate::{validate, ValidationFailure};

pub mod auth;
pub mod google;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use auth::{resolve_credential, Credential};
pub use google::GoogleBackend;
pub use traits::{
    GenerationBackend, GenerationRequest, GenerationResponse, RequestKind, Usage,
};

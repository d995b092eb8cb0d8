//! Template Fallback Responses
//!
//! Deterministic spoken answers built from the scene record alone, used
//! when no vision-language model or remote agent is reachable.

mod templates;

pub use templates::{QueryKind, ResponseTemplates};

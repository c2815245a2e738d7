//! Framebuffer coordinate types.
//!
//! Canonical space:
//! - Physical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! NDC +Y maps to the top edge, so viewport projections negate Y.

mod viewport;

pub use viewport::Viewport;

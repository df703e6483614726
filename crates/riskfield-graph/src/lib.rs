//! Graph pressure propagation.
//!
//! Entities form a weighted undirected graph. One diffusion pass moves each
//! entity's pressure toward its neighbors' from a single consistent
//! snapshot: `p'_i = p_i + α·Σ_j w_ij (p_j − p_i)`. The damping α is
//! validated against the topology before any pass runs (Gershgorin bound on
//! the diffusion operator), so divergence is a configuration failure rather
//! than a runtime surprise.

pub mod error;
pub mod propagate;
pub mod topology;

pub use error::GraphError;
pub use propagate::Propagator;
pub use topology::{GraphEdge, Topology};

use kmesh::engine::config::SolverConfig;

/// Fully resolved settings for one `solve` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveConfig {
    pub target_density: f64,
    pub solver: SolverConfig,
}

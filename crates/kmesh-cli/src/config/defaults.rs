use crate::cli::StrategyArg;
use kmesh::engine::tolerance::Tolerance;

/// Built-in values used when neither the CLI nor the config file sets a key.
///
/// The target density is deliberately absent: it has to be chosen by the user.
pub struct DefaultsConfig {
    pub only_even: bool,
    pub strategy: StrategyArg,
    pub tolerance_relative: f64,
    pub tolerance_absolute: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            only_even: false,
            strategy: StrategyArg::Balanced,
            tolerance_relative: Tolerance::DEFAULT_RELATIVE,
            tolerance_absolute: Tolerance::DEFAULT_ABSOLUTE,
        }
    }
}

//! Policy layer configuration.

/// Configuration for the guard and service layer.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Allow actors without a resolvable home cabinet to operate
    /// unscoped. Tenant checks fail closed when this is off, which is
    /// the only safe setting outside initial data loading.
    pub bootstrap_exemption: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            bootstrap_exemption: false,
        }
    }
}

impl PolicyConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults. `CLINIQ_BOOTSTRAP_EXEMPTION=1` enables the exemption.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bootstrap_exemption = std::env::var("CLINIQ_BOOTSTRAP_EXEMPTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.bootstrap_exemption);
        Self {
            bootstrap_exemption,
        }
    }
}

/// Controls policy loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Maximum bytes accepted from a policy file, reader or string.
    pub max_policy_size: usize,
    /// Maximum nesting depth of sub-policies. The top level is depth 1.
    pub max_depth: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_policy_size: 256 * 1024,
            max_depth: 32,
        }
    }
}

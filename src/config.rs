/// Interpreter limits and entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Deepest allowed nesting of language-level calls.
    pub max_call_depth: usize,
    /// Live heap slots that trigger a collection between top-level statements.
    pub gc_threshold: usize,
    /// Function called after the top-level statements have run.
    pub entry_point: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_call_depth: 2000,
            gc_threshold: 4096,
            entry_point: String::from("main"),
        }
    }
}

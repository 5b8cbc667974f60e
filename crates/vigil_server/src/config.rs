//! Server configuration.

/// Configuration for the reference server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Number of listing requests that still see the old state after a
    /// command is accepted. Zero applies commands immediately.
    pub apply_after_polls: u32,
    /// First id handed out to a created object.
    pub first_object_id: u32,
    /// Name of the root group (id 0).
    pub root_name: String,
    /// Prefix the server puts in front of names it generates for
    /// template sensors.
    pub generated_name_prefix: String,
}

impl ServerConfig {
    /// Creates a configuration that applies commands after the given
    /// number of listing requests.
    pub fn new(apply_after_polls: u32) -> Self {
        Self {
            apply_after_polls,
            first_object_id: 1001,
            root_name: "Root".into(),
            generated_name_prefix: " ".into(),
        }
    }

    /// Sets the apply latency, in listing requests.
    pub fn with_apply_after_polls(mut self, polls: u32) -> Self {
        self.apply_after_polls = polls;
        self
    }

    /// Sets the first object id.
    pub fn with_first_object_id(mut self, id: u32) -> Self {
        self.first_object_id = id;
        self
    }

    /// Sets the generated name prefix.
    pub fn with_generated_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.generated_name_prefix = prefix.into();
        self
    }

    /// Never applies accepted commands. Useful for exercising timeouts.
    pub fn stalled() -> Self {
        Self::new(u32::MAX)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

//! # Isolation settings.
//!
//! [`SandboxConfig`] selects whether an app runs in an isolation container and which
//! style isolation it gets.
//!
//! - `strict_style_isolation`: wrapper content lives under a shadow root
//! - `experimental_style_isolation`: embedded stylesheets are rewritten to a scoped selector
//! - `loose`: the container may leak writes to the host context (no strict execution)
//!
//! Both style isolations are incompatible with a custom render function.

/// Isolation configuration of one load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SandboxConfig {
    /// Scripts run against the host's global context.
    Disabled,
    /// Scripts run inside a sandbox created by the framework's factory.
    Enabled {
        strict_style_isolation: bool,
        experimental_style_isolation: bool,
        loose: bool,
    },
}

impl SandboxConfig {
    /// Enabled, no style isolation, strict execution.
    pub const fn enabled() -> Self {
        SandboxConfig::Enabled {
            strict_style_isolation: false,
            experimental_style_isolation: false,
            loose: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, SandboxConfig::Enabled { .. })
    }

    /// Shadow-root style isolation requested.
    pub fn strict_style_isolation(&self) -> bool {
        matches!(
            self,
            SandboxConfig::Enabled {
                strict_style_isolation: true,
                ..
            }
        )
    }

    /// Scoped stylesheet rewriting requested.
    pub fn scoped_css(&self) -> bool {
        matches!(
            self,
            SandboxConfig::Enabled {
                experimental_style_isolation: true,
                ..
            }
        )
    }

    pub fn loose(&self) -> bool {
        matches!(self, SandboxConfig::Enabled { loose: true, .. })
    }

    /// Enabled with shadow-root style isolation.
    #[must_use]
    pub fn with_strict_style_isolation(self) -> Self {
        match self {
            SandboxConfig::Enabled {
                experimental_style_isolation,
                loose,
                ..
            } => SandboxConfig::Enabled {
                strict_style_isolation: true,
                experimental_style_isolation,
                loose,
            },
            SandboxConfig::Disabled => SandboxConfig::Enabled {
                strict_style_isolation: true,
                experimental_style_isolation: false,
                loose: false,
            },
        }
    }

    /// Enabled with scoped stylesheet rewriting.
    #[must_use]
    pub fn with_scoped_css(self) -> Self {
        match self {
            SandboxConfig::Enabled {
                strict_style_isolation,
                loose,
                ..
            } => SandboxConfig::Enabled {
                strict_style_isolation,
                experimental_style_isolation: true,
                loose,
            },
            SandboxConfig::Disabled => SandboxConfig::Enabled {
                strict_style_isolation: false,
                experimental_style_isolation: true,
                loose: false,
            },
        }
    }

    /// Serialized form stored on the wrapper's `data-sandbox-cfg` attribute.
    pub fn describe(&self) -> String {
        match self {
            SandboxConfig::Disabled => "false".to_string(),
            SandboxConfig::Enabled {
                strict_style_isolation,
                experimental_style_isolation,
                loose,
            } => serde_json::json!({
                "strictStyleIsolation": strict_style_isolation,
                "experimentalStyleIsolation": experimental_style_isolation,
                "loose": loose,
            })
            .to_string(),
        }
    }
}

impl Default for SandboxConfig {
    /// Returns [`SandboxConfig::enabled`].
    fn default() -> Self {
        SandboxConfig::enabled()
    }
}

//! # Lifecycle export discovery.
//!
//! After script execution the lifecycle functions are looked up through a fixed list
//! of sources; the first one yielding a valid `bootstrap`/`mount`/`unmount` triple wins.
//!
//! ```text
//! 1. ModuleExports   what the executor returned
//! 2. LatestSetProp   the global most recently assigned during execution
//! 3. NamedGlobal     the global named after the app
//! ```

use crate::apps::{LifecycleExports, ModuleExports};
use crate::error::FrameworkError;
use crate::host::ExecutionContext;

/// One place lifecycle exports may be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportSource {
    ModuleExports,
    LatestSetProp,
    NamedGlobal,
}

/// Discovery order.
pub const EXPORT_SOURCES: [ExportSource; 3] = [
    ExportSource::ModuleExports,
    ExportSource::LatestSetProp,
    ExportSource::NamedGlobal,
];

/// Inputs of discovery.
pub(crate) struct Discovery<'a> {
    pub app_name: &'a str,
    pub module: &'a ModuleExports,
    pub global: &'a ExecutionContext,
    pub latest_set_prop: Option<String>,
}

impl ExportSource {
    /// Candidate export object from this source, if any.
    pub(crate) fn candidate(&self, d: &Discovery<'_>) -> Option<ModuleExports> {
        match self {
            ExportSource::ModuleExports => Some(d.module.clone()),
            ExportSource::LatestSetProp => {
                let prop = d.latest_set_prop.as_deref()?;
                d.global.exports(prop)
            }
            ExportSource::NamedGlobal => d.global.exports(d.app_name),
        }
    }
}

/// Resolves lifecycle exports through [`EXPORT_SOURCES`].
pub(crate) fn resolve(d: &Discovery<'_>) -> Result<(ExportSource, LifecycleExports), FrameworkError> {
    EXPORT_SOURCES
        .iter()
        .find_map(|source| {
            let exports = source.candidate(d)?.validate()?;
            Some((*source, exports))
        })
        .ok_or_else(|| FrameworkError::LifecycleNotExported {
            app: d.app_name.to_string(),
        })
}

//! # App descriptors.
//!
//! A descriptor is immutable once handed to the framework; `name` is its only identity.
//!
//! - [`LoadableApp`] is the shape the orchestrator consumes (manual loading).
//! - [`RegistrableApp`] adds an activation predicate and an optional loading indicator
//!   for route-driven activation.
//!
//! ## Example
//! ```rust
//! use microvisor::{LoadableApp, RegistrableApp};
//! use serde_json::json;
//!
//! let manual = LoadableApp::new("dashboard", "//localhost:7100")
//!     .with_container("#panel")
//!     .with_props(json!({ "theme": "dark" }));
//! assert_eq!(manual.name, "dashboard");
//!
//! let routed = RegistrableApp::new("vue", "//localhost:7101", |path| path.starts_with("/vue"))
//!     .with_container("#subapp");
//! assert!((routed.active_when)("/vue/list"));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::host::{Document, Element};

/// Where an app's resources come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// HTML entry URL.
    Url(String),
    /// Explicit resource list.
    Manifest(EntryManifest),
}

/// Explicit resource list entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryManifest {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
}

impl From<&str> for Entry {
    fn from(url: &str) -> Self {
        Entry::Url(url.to_string())
    }
}

impl From<String> for Entry {
    fn from(url: String) -> Self {
        Entry::Url(url)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Url(url) => f.write_str(url),
            Entry::Manifest(m) => write!(f, "manifest(scripts={:?})", m.scripts),
        }
    }
}

/// Where an app is rendered: a selector resolved on demand, or a concrete element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountTarget {
    Selector(String),
    Element(Element),
}

impl MountTarget {
    /// Resolves the target against the document. Elements resolve to themselves.
    pub fn resolve(&self, document: &Document) -> Option<Element> {
        match self {
            MountTarget::Selector(sel) => document.query_selector(sel),
            MountTarget::Element(el) => Some(el.clone()),
        }
    }

    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            MountTarget::Selector(sel) => sel.clone(),
            MountTarget::Element(el) => format!("{el:?}"),
        }
    }
}

impl From<&str> for MountTarget {
    fn from(sel: &str) -> Self {
        MountTarget::Selector(sel.to_string())
    }
}

impl From<String> for MountTarget {
    fn from(sel: String) -> Self {
        MountTarget::Selector(sel)
    }
}

impl From<Element> for MountTarget {
    fn from(el: Element) -> Self {
        MountTarget::Element(el)
    }
}

/// Argument of a custom render function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyRenderProps {
    pub loading: bool,
    /// Serialized wrapper markup; empty once the app is unmounted.
    pub app_content: String,
}

/// Custom render function replacing container-based rendering.
pub type LegacyRender = Arc<dyn Fn(LegacyRenderProps) + Send + Sync>;

/// Activation predicate evaluated against the current location.
pub type ActiveWhen = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Loading indicator callback (`true` while loading, `false` once mounted).
pub type LoadingIndicator = Arc<dyn Fn(bool) + Send + Sync>;

/// Descriptor consumed by the orchestrator.
#[derive(Clone)]
pub struct LoadableApp {
    /// Unique app name.
    pub name: String,
    /// Entry reference handed to the entry loader.
    pub entry: Entry,
    /// Mount target; required unless `render` is given.
    pub container: Option<MountTarget>,
    /// Custom render function.
    pub render: Option<LegacyRender>,
    /// Custom props passed to every lifecycle function.
    pub props: Value,
}

impl LoadableApp {
    pub fn new(name: impl Into<String>, entry: impl Into<Entry>) -> Self {
        Self {
            name: name.into(),
            entry: entry.into(),
            container: None,
            render: None,
            props: Value::Object(Map::new()),
        }
    }

    pub fn with_container(mut self, container: impl Into<MountTarget>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(LegacyRenderProps) + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }
}

impl fmt::Debug for LoadableApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadableApp")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("container", &self.container)
            .field("render", &self.render.is_some())
            .field("props", &self.props)
            .finish()
    }
}

/// Descriptor for route-driven activation.
#[derive(Clone)]
pub struct RegistrableApp {
    pub app: LoadableApp,
    pub active_when: ActiveWhen,
    pub loader: Option<LoadingIndicator>,
}

impl RegistrableApp {
    pub fn new<F>(name: impl Into<String>, entry: impl Into<Entry>, active_when: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            app: LoadableApp::new(name, entry),
            active_when: Arc::new(active_when),
            loader: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.app.name
    }

    pub fn with_container(mut self, container: impl Into<MountTarget>) -> Self {
        self.app = self.app.with_container(container);
        self
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.app = self.app.with_props(props);
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(LegacyRenderProps) + Send + Sync + 'static,
    {
        self.app = self.app.with_render(render);
        self
    }

    pub fn with_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }
}

impl fmt::Debug for RegistrableApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrableApp")
            .field("app", &self.app)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_deserializes_both_shapes() {
        let url: Entry = serde_json::from_str("\"//localhost:7100\"").unwrap();
        assert_eq!(url, Entry::Url("//localhost:7100".into()));

        let manifest: Entry =
            serde_json::from_str(r#"{"scripts":["//cdn/app.js"],"styles":[]}"#).unwrap();
        match manifest {
            Entry::Manifest(m) => {
                assert_eq!(m.scripts, vec!["//cdn/app.js".to_string()]);
                assert!(m.html.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mount_target_resolution() {
        let doc = Document::new();
        let el = Element::new("div").with_id("subapp");
        doc.body().append_child(&el);

        assert_eq!(MountTarget::from("#subapp").resolve(&doc), Some(el.clone()));
        assert_eq!(MountTarget::from("#nope").resolve(&doc), None);

        let detached = Element::new("section");
        assert_eq!(
            MountTarget::from(detached.clone()).resolve(&doc),
            Some(detached)
        );
        assert_eq!(MountTarget::from(el).describe(), "<div id=\"subapp\">");
    }
}

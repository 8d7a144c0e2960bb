//! # Instance wrapper and render contract.
//!
//! Every instance renders into a wrapper element:
//!
//! ```text
//! <div id="__microvisor_wrapper_for_react_1700000000000_x1y2z3__"
//!      data-name="react" data-version="0.1.0" data-sandbox-cfg='{"loose":false,...}'
//!      [data-microvisor="react"]>           ◄── scoped css only
//!   <microvisor-head>…</microvisor-head>    ◄── template head, or an empty simulated one
//!   …template body…
//! </div>
//! ```
//!
//! [`Renderer::render`] attaches the wrapper to the resolved container:
//! - custom render function present → delegate, nothing else
//! - container missing → error, except in the `Unmounted` phase
//! - container does not hold the wrapper → clear it, then append the wrapper (if any)

use std::sync::LazyLock;

use regex::Regex;

use crate::apps::{LegacyRender, LegacyRenderProps, MountTarget, RenderPhase};
use crate::error::FrameworkError;
use crate::events::{Bus, Event, EventKind};
use crate::host::styles::{self, SCOPE_ATTR};
use crate::host::{Document, Element};
use crate::policies::SandboxConfig;

/// Tag replacing `<head>` inside wrappers.
pub const HEAD_TAG: &str = "microvisor-head";

static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(\s[^>]*)?>").expect("Invalid head open regex"));
static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head>").expect("Invalid head close regex"));

/// Wrapper element id for an instance.
pub fn wrapper_id(instance_id: &str) -> String {
    format!("__microvisor_wrapper_for_{}__", snake_case(instance_id))
}

fn snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c.to_ascii_lowercase());
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_string()
}

/// Everything needed to (re)build an instance's wrapper element.
#[derive(Clone, Debug)]
pub(crate) struct WrapperTemplate {
    id: String,
    app_name: String,
    sandbox_cfg: String,
    content: String,
    strict_style_isolation: bool,
    scoped_css: bool,
}

impl WrapperTemplate {
    pub(crate) fn new(
        instance_id: &str,
        app_name: &str,
        sandbox: &SandboxConfig,
        template: &str,
    ) -> Self {
        let scoped_css = sandbox.scoped_css();
        let content = simulate_head(template);
        let content = if scoped_css {
            styles::scope_template_styles(&content, app_name)
        } else {
            content
        };
        Self {
            id: wrapper_id(instance_id),
            app_name: app_name.to_string(),
            sandbox_cfg: sandbox.describe(),
            content,
            strict_style_isolation: sandbox.strict_style_isolation(),
            scoped_css,
        }
    }

    /// Builds a fresh wrapper element.
    ///
    /// Strict style isolation degrades to none when the document has no shadow DOM.
    pub(crate) fn build(&self, document: &Document, bus: &Bus) -> Element {
        let el = Element::new("div")
            .with_id(self.id.as_str())
            .with_attribute("data-name", self.app_name.as_str())
            .with_attribute("data-version", env!("CARGO_PKG_VERSION"))
            .with_attribute("data-sandbox-cfg", self.sandbox_cfg.as_str())
            .with_inner_html(self.content.as_str());

        if self.strict_style_isolation {
            if document.supports_shadow_dom() {
                el.attach_shadow();
            } else {
                bus.publish(
                    Event::new(EventKind::SandboxDegraded)
                        .with_app(self.app_name.as_str())
                        .with_reason("shadow_dom"),
                );
            }
        }
        if self.scoped_css {
            el.set_attribute(SCOPE_ATTR, self.app_name.as_str());
        }
        el
    }
}

fn simulate_head(template: &str) -> String {
    if HEAD_OPEN.is_match(template) {
        let opened = HEAD_OPEN.replace_all(template, format!("<{HEAD_TAG}$1>"));
        HEAD_CLOSE
            .replace_all(&opened, format!("</{HEAD_TAG}>"))
            .into_owned()
    } else {
        format!("<{HEAD_TAG}></{HEAD_TAG}>{template}")
    }
}

/// Render contract of one mount target.
#[derive(Clone)]
pub(crate) struct Renderer {
    pub(crate) instance_id: String,
    pub(crate) container: Option<MountTarget>,
    pub(crate) legacy: Option<LegacyRender>,
    pub(crate) document: Document,
}

impl Renderer {
    pub(crate) fn render(
        &self,
        element: Option<&Element>,
        phase: RenderPhase,
    ) -> Result<(), FrameworkError> {
        if let Some(render) = &self.legacy {
            render(LegacyRenderProps {
                loading: phase == RenderPhase::Loading,
                app_content: element.map(Element::outer_html).unwrap_or_default(),
            });
            return Ok(());
        }

        let resolved = self
            .container
            .as_ref()
            .and_then(|target| target.resolve(&self.document));
        let Some(container) = resolved else {
            if phase == RenderPhase::Unmounted {
                return Ok(());
            }
            return Err(FrameworkError::ContainerNotFound {
                app: self.instance_id.clone(),
                phase,
                container: self
                    .container
                    .as_ref()
                    .map(MountTarget::describe)
                    .unwrap_or_else(|| "<none>".to_string()),
            });
        };

        if !element.is_some_and(|el| container.contains(el)) {
            container.clear_children();
            if let Some(el) = element {
                container.append_child(el);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    fn renderer(doc: &Document, container: Option<&str>) -> Renderer {
        Renderer {
            instance_id: "react_1".into(),
            container: container.map(MountTarget::from),
            legacy: None,
            document: doc.clone(),
        }
    }

    #[test]
    fn ids_are_snake_cased() {
        assert_eq!(
            wrapper_id("myApp_1700000000000_ab12cd"),
            "__microvisor_wrapper_for_my_app_1700000000000_ab12cd__"
        );
        assert_eq!(wrapper_id("vue-3 app"), "__microvisor_wrapper_for_vue_3_app__");
    }

    #[test]
    fn head_is_simulated_or_rewritten() {
        assert_eq!(
            simulate_head("<p>x</p>"),
            "<microvisor-head></microvisor-head><p>x</p>"
        );
        assert_eq!(
            simulate_head("<head lang=\"en\"><title>t</title></head><p>x</p>"),
            "<microvisor-head lang=\"en\"><title>t</title></microvisor-head><p>x</p>"
        );
    }

    #[test]
    fn build_applies_style_isolation() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let cfg = SandboxConfig::enabled()
            .with_strict_style_isolation()
            .with_scoped_css();
        let tpl = WrapperTemplate::new("react_1", "react", &cfg, "<style>.a{b:c}</style>");

        let el = tpl.build(&Document::new(), &bus);
        assert!(el.has_shadow_root());
        assert_eq!(el.attribute(SCOPE_ATTR).as_deref(), Some("react"));
        assert_eq!(el.attribute("data-name").as_deref(), Some("react"));
        assert!(el.inner_html().contains("div[data-microvisor=\"react\"] .a"));

        let degraded = tpl.build(&Document::new().with_shadow_dom(false), &bus);
        assert!(!degraded.has_shadow_root());
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::SandboxDegraded);
    }

    #[test]
    fn missing_container_fails_except_when_unmounted() {
        let doc = Document::new();
        let r = renderer(&doc, Some("#nope"));
        let el = Element::new("div");

        let err = r.render(Some(&el), RenderPhase::Mounting).unwrap_err();
        assert_eq!(
            err.to_string(),
            "target container with #nope not existed while react_1 mounting!"
        );
        assert!(r.render(None, RenderPhase::Unmounted).is_ok());
    }

    #[test]
    fn render_replaces_foreign_children_once() {
        let doc = Document::new();
        let container = Element::new("div").with_id("c");
        doc.body().append_child(&container);
        container.append_child(&Element::new("span"));

        let r = renderer(&doc, Some("#c"));
        let el = Element::new("div").with_id("w");
        r.render(Some(&el), RenderPhase::Loading).unwrap();
        assert_eq!(container.children(), vec![el.clone()]);

        let sibling = Element::new("i");
        container.append_child(&sibling);
        r.render(Some(&el), RenderPhase::Mounted).unwrap();
        assert_eq!(container.children().len(), 2);

        r.render(None, RenderPhase::Unmounted).unwrap();
        assert!(container.children().is_empty());
    }

    #[test]
    fn legacy_render_gets_markup() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let r = Renderer {
            legacy: Some(Arc::new(move |p: LegacyRenderProps| sink.lock().push(p))),
            ..renderer(&Document::new(), None)
        };
        let el = Element::new("div").with_id("w");
        r.render(Some(&el), RenderPhase::Loading).unwrap();
        r.render(None, RenderPhase::Unmounted).unwrap();

        let seen = seen.lock();
        assert!(seen[0].loading);
        assert_eq!(seen[0].app_content, "<div id=\"w\"></div>");
        assert!(!seen[1].loading && seen[1].app_content.is_empty());
    }
}

use std::path::Path;
use std::sync::{Arc, LazyLock, RwLock};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::error::TplError;
use crate::loader::{load_assets_into, load_from_path};
use crate::options::TemplateOptions;
use crate::tpl::engine::{Template, content_hash, context_value, render_template};
use crate::tpl::render_context::Context;
use crate::value::Value;

/// Name the page output is bound to while a layout renders.
pub const YIELD: &str = "yield";

// Process-wide singleton, initialised on first use.
pub static TEMPLATES: LazyLock<Templates> = LazyLock::new(Templates::new);

/// The process-wide registry.
pub fn templates() -> &'static Templates {
    &TEMPLATES
}

/// Named, parsed templates shared across threads.
///
/// Publishing replaces the stored `Arc`, so a render already holding the
/// previous version finishes against it while new renders see the update.
pub struct Templates {
    templates: DashMap<String, Arc<Template>>,
    default_layout: RwLock<Option<String>>,
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl Templates {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
            default_layout: RwLock::new(None),
        }
    }

    /// Register embedded assets, then every template under `assets_path`.
    /// Returns how many templates were registered.
    pub fn configure(&self, options: &TemplateOptions<'_>) -> Result<usize, TplError> {
        let mut count = 0;
        if let Some(assets) = &options.assets {
            count += load_assets_into(self, assets.iter().copied())?;
        }
        if let Some(path) = options.assets_path {
            count += load_from_path(self, Path::new(path), &options.extension)?;
        }
        if let Some(layout) = &options.layout {
            self.set_default_layout(Some(layout.clone()));
        }
        Ok(count)
    }

    /// Parse and publish `source` under `name`.
    ///
    /// Unchanged content keeps the published template without re-parsing.
    /// On a parse error the previously published version stays in place.
    pub fn insert(&self, name: &str, source: &str) -> Result<Arc<Template>, TplError> {
        let hash = content_hash(source);
        if let Some(current) = self.templates.get(name) {
            if current.content_hash() == hash {
                debug!("publish: template={}, skipped=true", name);
                return Ok(current.value().clone());
            }
        }

        let template = Arc::new(Template::parse(name, source)?);
        debug!(
            "publish: template={}, nodes={}, skipped=false",
            name,
            template.nodes().len()
        );
        self.templates.insert(name.to_string(), template.clone());
        Ok(template)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.get(name).map(|t| t.value().clone())
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.remove(name).map(|(_, t)| t)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn default_layout(&self) -> Option<String> {
        self.default_layout
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_default_layout(&self, layout: Option<String>) {
        *self
            .default_layout
            .write()
            .unwrap_or_else(|e| e.into_inner()) = layout;
    }

    /// Render `name`, optionally wrapped in `layout`.
    ///
    /// The layout sees the same context as the page plus `yield`, bound to
    /// the rendered page.
    pub fn render<T: Serialize + ?Sized>(
        &self,
        name: &str,
        context: Option<&T>,
        layout: Option<&str>,
    ) -> Result<String, TplError> {
        let page = self.lookup(name)?;
        let layout = layout.map(|l| self.lookup(l)).transpose()?;

        let root = context_value(context)?;
        let ctx = Context::new(&root);
        let body = render_template(&page, &ctx)?;
        match layout {
            None => Ok(body),
            Some(layout) => {
                let body = Value::Str(body);
                render_template(&layout, &ctx.bind(YIELD, &body))
            }
        }
    }

    /// Render `name` with the configured default layout, if any.
    pub fn render_default<T: Serialize + ?Sized>(
        &self,
        name: &str,
        context: Option<&T>,
    ) -> Result<String, TplError> {
        let layout = self.default_layout();
        self.render(name, context, layout.as_deref())
    }

    fn lookup(&self, name: &str) -> Result<Arc<Template>, TplError> {
        self.get(name)
            .ok_or_else(|| TplError::TemplateNotFound(name.to_string()))
    }
}

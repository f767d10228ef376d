/// Where templates come from and how they are rendered by default.
pub struct TemplateOptions<'a> {
    pub assets: Option<Vec<(&'a str, &'a str)>>, // (name, source) pairs embedded in the binary
    pub assets_path: Option<&'a str>,            // directory walked for template files
    pub extension: String,                       // file extension picked up from `assets_path`
    pub layout: Option<String>,                  // layout applied by `render_default`
}

impl Default for TemplateOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TemplateOptions<'a> {
    pub fn new() -> Self {
        TemplateOptions {
            assets: None,
            assets_path: None,
            extension: "html".to_string(),
            layout: None,
        }
    }

    pub fn assets(mut self, assets: Vec<(&'a str, &'a str)>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn assets_path(mut self, assets_path: &'a str) -> Self {
        self.assets_path = Some(assets_path);
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = TemplateOptions::new()
            .assets(vec![("index", "hi")])
            .assets_path("views")
            .extension(".tpl")
            .layout("layout");

        assert_eq!(options.assets.unwrap().len(), 1);
        assert_eq!(options.assets_path, Some("views"));
        assert_eq!(options.extension, "tpl");
        assert_eq!(options.layout.as_deref(), Some("layout"));
    }

    #[test]
    fn test_defaults() {
        let options = TemplateOptions::default();
        assert_eq!(options.extension, "html");
        assert!(options.layout.is_none());
    }
}

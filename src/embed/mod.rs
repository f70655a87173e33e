//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `document` - The document shell (document.html) and its inline runtime
//! - `serve` - Live session resources (reload agent, loading page)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{RELOAD_JS, ReloadVars};
//!
//! let js = RELOAD_JS.render(&ReloadVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars, substitute};

pub mod document {
    use super::{Template, TemplateVars, substitute};

    /// Browser runtime defining `mdxref` and `window.mdlive`.
    pub const RUNTIME_JS: &str = include_str!("runtime.js");

    /// Variables for document.html. All values are inserted verbatim.
    pub struct DocumentVars<'a> {
        pub title: &'a str,
        pub font: &'a str,
        pub scripts: &'a str,
        pub styles: &'a str,
        pub head: &'a str,
        pub body: &'a str,
        pub content: &'a str,
    }

    impl TemplateVars for DocumentVars<'_> {
        fn apply(&self, content: &str) -> String {
            substitute(
                content,
                &[
                    ("__TITLE__", self.title),
                    ("__FONT__", self.font),
                    ("__SCRIPTS__", self.scripts),
                    ("__RUNTIME__", RUNTIME_JS.trim_end()),
                    ("__STYLES__", self.styles),
                    ("__HEAD__", self.head),
                    ("__BODY__", self.body),
                    ("__CONTENT__", self.content),
                ],
            )
        }
    }

    /// Complete HTML document shell.
    pub const DOCUMENT_HTML: Template<DocumentVars<'static>> =
        Template::new(include_str!("document.html"));
}

pub mod serve {
    use super::{Template, TemplateVars, substitute};

    /// Variables for reload.js.
    pub struct ReloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Variables for loading.html.
    pub struct LoadingVars<'a> {
        /// Escaped document name.
        pub title: &'a str,
    }

    impl TemplateVars for LoadingVars<'_> {
        fn apply(&self, content: &str) -> String {
            substitute(content, &[("__TITLE__", self.title)])
        }
    }

    /// Client reload agent: view state manager plus push channel client.
    pub const RELOAD_JS: Template<ReloadVars> = Template::new(include_str!("serve/reload.js"));

    /// Page answered before the first render completes.
    pub const LOADING_HTML: Template<LoadingVars<'static>> =
        Template::new(include_str!("serve/loading.html"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_js_with_vars() {
        let js = serve::RELOAD_JS.render(&serve::ReloadVars { ws_port: 35730 });
        assert!(js.contains("location.hostname + ':35730'"));
        assert!(!js.contains("__WS_PORT__"));
        assert!(js.contains("sessionStorage"));
        assert!(js.contains("msg.type === 'reload'"));
    }

    #[test]
    fn test_loading_page() {
        let html = serve::LOADING_HTML.render(&serve::LoadingVars { title: "notes.md" });
        assert!(html.contains("<title>notes.md</title>"));
        assert!(!html.contains("__TITLE__"));
    }

    #[test]
    fn test_runtime_defines_mdxref() {
        assert!(document::RUNTIME_JS.contains("window.mdxref"));
        assert!(document::RUNTIME_JS.contains("startTime"));
    }
}

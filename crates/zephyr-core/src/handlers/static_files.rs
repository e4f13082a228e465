//! Static file serving
//!
//! Resolves a captured `filepath` under a root directory and turns the file
//! into a [`Response`] with content type, ETag and caching headers.

use crate::{Request, Response, StatusCode};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Static file configuration
#[derive(Clone)]
pub struct StaticFileConfig {
    /// Root directory
    pub root: PathBuf,
    /// Index file served for directories
    pub index: String,
    /// Cache max-age in seconds
    pub max_age: u32,
    /// Enable ETag
    pub etag: bool,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// Serve dot files
    pub hidden: bool,
}

impl Default for StaticFileConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            index: "index.html".to_string(),
            max_age: 86400, // 1 day
            etag: true,
            headers: HashMap::new(),
            hidden: false,
        }
    }
}

impl StaticFileConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = name.into();
        self
    }

    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = seconds;
        self
    }

    pub fn etag(mut self, enabled: bool) -> Self {
        self.etag = enabled;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn hidden(mut self, enabled: bool) -> Self {
        self.hidden = enabled;
        self
    }
}

/// Static file handler
#[derive(Clone)]
pub struct StaticFiles {
    config: StaticFileConfig,
}

impl StaticFiles {
    pub fn new(config: StaticFileConfig) -> Self {
        Self { config }
    }

    /// Serve static files from directory
    pub fn serve(root: impl Into<PathBuf>) -> Self {
        Self::new(StaticFileConfig::new(root))
    }

    /// Map a relative file path to an existing file under the root.
    ///
    /// Directories resolve to their index file. Traversal (`..`) and, unless
    /// enabled, dot files resolve to nothing.
    pub fn resolve(&self, file: &str) -> Option<PathBuf> {
        let relative = self.sanitize_path(file)?;
        let full_path = self.config.root.join(relative);

        let meta = std::fs::metadata(&full_path).ok()?;
        if meta.is_file() {
            return Some(full_path);
        }
        if meta.is_dir() {
            let index_path = full_path.join(&self.config.index);
            if index_path.is_file() {
                return Some(index_path);
            }
        }
        None
    }

    /// Build the response for a resolved file
    pub fn serve_file(&self, path: &Path, req: &Request) -> Response {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(_) => return self.not_found(),
        };

        let etag = self.config.etag.then(|| generate_etag(&meta));
        if let (Some(etag), Some(if_none_match)) = (&etag, req.header("if-none-match")) {
            if if_none_match == etag.as_str() {
                return Response::new(StatusCode::NOT_MODIFIED);
            }
        }

        let content = match std::fs::read(path) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read static file");
                return self.not_found();
            }
        };

        let mut res = Response::ok();
        res.set_header("Content-Type", mime_type(path));
        res.set_header("Content-Length", content.len().to_string());
        if let Some(etag) = etag {
            res.set_header("ETag", etag);
        }
        if self.config.max_age > 0 {
            res.set_header("Cache-Control", format!("max-age={}", self.config.max_age));
        }
        for (k, v) in &self.config.headers {
            res.set_header(k, v.clone());
        }

        // HEAD request - no body
        if !req.method.eq_ignore_ascii_case("HEAD") {
            res.write(&content);
        }
        res
    }

    /// Sanitize request path to prevent directory traversal
    fn sanitize_path(&self, path: &str) -> Option<PathBuf> {
        let path = path.trim_start_matches('/');

        // Check for hidden files
        if !self.config.hidden && path.split('/').any(|s| s.starts_with('.')) {
            return None;
        }

        // Normalize and check for traversal
        let mut result = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(c) => result.push(c),
                Component::ParentDir => return None, // Prevent ../
                _ => {}
            }
        }

        Some(result)
    }

    fn not_found(&self) -> Response {
        Response::new(StatusCode::NOT_FOUND)
    }
}

fn generate_etag(meta: &std::fs::Metadata) -> String {
    use std::time::UNIX_EPOCH;

    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let size = meta.len();
    format!("\"{:x}-{:x}\"", mtime, size)
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match ext.to_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",

        "pdf" => "application/pdf",
        "wasm" => "application/wasm",

        // Default
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Context, Engine, RequestBuilder};

    /// Fresh directory under the system temp dir holding `css/a.css`
    fn fixture(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("zephyr-static-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("css")).unwrap();
        std::fs::write(root.join("css/a.css"), "body{}").unwrap();
        std::fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
        root
    }

    #[test]
    fn test_sanitize_path() {
        let handler = StaticFiles::serve(".");

        assert!(handler.sanitize_path("/index.html").is_some());
        assert!(handler.sanitize_path("css/style.css").is_some());
        assert!(handler.sanitize_path("/../etc/passwd").is_none());
        assert!(handler.sanitize_path("/.hidden").is_none());
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(mime_type(Path::new("style.css")), "text/css; charset=utf-8");
        assert_eq!(mime_type(Path::new("image.PNG")), "image/png");
        assert_eq!(mime_type(Path::new("unknown")), "application/octet-stream");
    }

    #[test]
    fn test_resolve() {
        let root = fixture("resolve");
        let files = StaticFiles::serve(&root);

        assert_eq!(files.resolve("css/a.css"), Some(root.join("css/a.css")));
        assert_eq!(files.resolve(""), Some(root.join("index.html")));
        assert_eq!(files.resolve("css"), None);
        assert_eq!(files.resolve("missing.js"), None);
        assert_eq!(files.resolve("../outside"), None);
    }

    #[test]
    fn test_static_route_serves_file() {
        let root = fixture("serve");
        let mut engine = Engine::new();
        engine.group("/v1").static_files("/assets", &root);

        let res = engine.handle(RequestBuilder::new("GET", "/v1/assets/css/a.css").build());
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.content_type(), Some("text/css; charset=utf-8"));
        assert_eq!(res.body_string().as_deref(), Some("body{}"));
        assert!(res.header("etag").is_some());
    }

    #[test]
    fn test_static_route_missing_file_is_bare_404() {
        let root = fixture("missing");
        let mut engine = Engine::new();
        engine.static_files("/assets", &root);

        let res = engine.handle(RequestBuilder::new("GET", "/assets/nope.js").build());
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_etag_revalidation_and_head() {
        let root = fixture("etag");
        let files = StaticFiles::serve(&root);
        let path = files.resolve("css/a.css").unwrap();

        let first = files.serve_file(&path, &RequestBuilder::new("GET", "/").build());
        let etag = first.header("etag").unwrap().to_string();

        let again = RequestBuilder::new("GET", "/").header("If-None-Match", etag).build();
        assert_eq!(files.serve_file(&path, &again).status, StatusCode::NOT_MODIFIED);

        let head = files.serve_file(&path, &RequestBuilder::new("HEAD", "/").build());
        assert_eq!(head.status, StatusCode::OK);
        assert!(head.body.is_empty());
        assert_eq!(head.header("content-length"), Some("6"));
    }

    #[test]
    fn test_static_route_answers_head() {
        let root = fixture("head");
        let mut engine = Engine::new();
        engine.static_files("/assets", &root);

        let res = engine.handle(RequestBuilder::new("HEAD", "/assets/css/a.css").build());
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.header("content-length"), Some("6"));
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_static_route_with_config() {
        let root = fixture("config");
        std::fs::write(root.join("css/home.html"), "<p>css home</p>").unwrap();
        std::fs::write(root.join(".env"), "SECRET=1").unwrap();

        let mut engine = Engine::new();
        engine.static_files_with(
            "/assets",
            StaticFileConfig::new(&root)
                .index("home.html")
                .max_age(0)
                .etag(false)
                .header("X-Served-By", "zephyr")
                .hidden(true),
        );

        let res = engine.handle(RequestBuilder::new("GET", "/assets/css").build());
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body_string().as_deref(), Some("<p>css home</p>"));
        assert_eq!(res.header("x-served-by"), Some("zephyr"));
        assert!(res.header("etag").is_none());
        assert!(res.header("cache-control").is_none());

        let res = engine.handle(RequestBuilder::new("GET", "/assets/.env").build());
        assert_eq!(res.body_string().as_deref(), Some("SECRET=1"));
    }

    #[test]
    fn test_static_route_runs_group_middleware() {
        let root = fixture("middleware");
        let mut engine = Engine::new();
        {
            let mut v1 = engine.group("/v1");
            v1.use_middleware(|ctx: &mut Context| {
                ctx.set_header("X-Group", "v1");
                ctx.next();
            });
            v1.static_files("/assets", &root);
        }

        let res = engine.handle(RequestBuilder::new("GET", "/v1/assets/css/a.css").build());
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.header("x-group"), Some("v1"));
        assert_eq!(res.body_string().as_deref(), Some("body{}"));
    }
}

//! Per-request context
//!
//! A [`Context`] carries the request, the response being written, the
//! captured route params and the handler chain with its cursor. It belongs to
//! exactly one request and is dropped once the response is handed back.

use crate::{HandlerFunc, Request, Response, Result, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

/// Request-scoped state passed to every handler in the chain
pub struct Context {
    /// HTTP method
    pub method: String,
    /// Request path (without query string)
    pub path: String,
    /// The incoming request
    pub request: Request,
    /// Route parameters captured by the router
    pub params: HashMap<String, String>,
    response: Response,
    handlers: Vec<HandlerFunc>,
    /// Index of the running handler, -1 before the chain starts
    index: isize,
}

impl Context {
    /// Create a context for `request` with an empty chain
    pub fn new(request: Request) -> Self {
        Self {
            method: request.method.clone(),
            path: request.path.clone(),
            request,
            params: HashMap::new(),
            response: Response::ok(),
            handlers: Vec::new(),
            index: -1,
        }
    }

    /// Append handlers to the chain
    pub fn push_handlers(&mut self, handlers: impl IntoIterator<Item = HandlerFunc>) {
        self.handlers.extend(handlers);
    }

    /// Number of handlers in the chain
    pub fn chain_len(&self) -> usize {
        self.handlers.len()
    }

    /// Run the next handler in the chain.
    ///
    /// Called from inside a handler, this runs everything downstream and
    /// returns, so code after the call sees the finished response. Once the
    /// cursor has moved past the last handler (or `fail` parked it there)
    /// further calls do nothing.
    pub fn next(&mut self) {
        self.index += 1;
        let handler = usize::try_from(self.index)
            .ok()
            .and_then(|i| self.handlers.get(i))
            .cloned();

        if let Some(handler) = handler {
            handler(self);
        }
    }

    /// Abort the chain and answer with `{"message": message}`
    pub fn fail(&mut self, code: StatusCode, message: &str) {
        self.index = self.handlers.len() as isize;
        if let Err(err) = self.json(code, &json!({ "message": message })) {
            tracing::error!(error = %err, "failed to write error response");
        }
    }

    /// Get a route parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First value of a query string parameter
    pub fn query(&self, key: &str) -> Option<String> {
        self.request.query_value(key)
    }

    /// First value of a url-encoded form field in the body
    pub fn post_form(&self, key: &str) -> Option<String> {
        self.request.form_value(key)
    }

    /// Set a response header
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        self.response.set_header(key, value);
    }

    /// Set the response status
    pub fn status(&mut self, code: StatusCode) {
        self.response.set_status(code);
    }

    /// Status the response currently carries
    pub fn status_code(&self) -> StatusCode {
        self.response.status
    }

    /// Append raw bytes to the response body
    pub fn write(&mut self, data: &[u8]) {
        self.response.write(data);
    }

    /// Write a JSON body
    pub fn json<T: Serialize + ?Sized>(&mut self, code: StatusCode, data: &T) -> Result<()> {
        let body = serde_json::to_vec(data)?;
        self.status(code);
        self.set_header("Content-Type", "application/json");
        self.write(&body);
        Ok(())
    }

    /// Write a plain text body
    pub fn string(&mut self, code: StatusCode, text: impl AsRef<str>) {
        self.status(code);
        self.set_header("Content-Type", "text/plain");
        self.write(text.as_ref().as_bytes());
    }

    /// Write an HTML body
    pub fn html(&mut self, code: StatusCode, html: impl AsRef<str>) {
        self.status(code);
        self.set_header("Content-Type", "text/html");
        self.write(html.as_ref().as_bytes());
    }

    /// Write raw bytes with a status
    pub fn data(&mut self, code: StatusCode, data: &[u8]) {
        self.status(code);
        self.write(data);
    }

    /// Discard the status, headers and body written so far
    pub fn reset_response(&mut self) {
        self.response.clear();
    }

    /// The response written so far
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Finish the request and take the response
    pub fn into_response(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str, call_next: bool) -> HandlerFunc {
        let log = Arc::clone(log);
        Arc::new(move |ctx: &mut Context| {
            log.lock().unwrap().push(format!("{name}:before"));
            if call_next {
                ctx.next();
            }
            log.lock().unwrap().push(format!("{name}:after"));
        })
    }

    fn context() -> Context {
        Context::new(Request::new("GET", "/"))
    }

    #[test]
    fn test_chain_wraps_downstream() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context();
        ctx.push_handlers([
            recorder(&log, "a", true),
            recorder(&log, "b", true),
            recorder(&log, "c", false),
        ]);
        ctx.next();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:before", "b:before", "c:before", "c:after", "b:after", "a:after"]
        );
    }

    #[test]
    fn test_handler_without_next_stops_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context();
        ctx.push_handlers([
            recorder(&log, "a", false),
            recorder(&log, "b", true),
        ]);
        ctx.next();

        assert_eq!(*log.lock().unwrap(), vec!["a:before", "a:after"]);
    }

    #[test]
    fn test_next_past_end_is_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context();
        ctx.push_handlers([recorder(&log, "a", true), recorder(&log, "b", true)]);
        ctx.next();
        assert_eq!(ctx.index, 2);

        // one past the end, then beyond it
        ctx.next();
        ctx.next();
        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_each_handler_runs_once_when_next_called_twice() {
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let mut ctx = context();
        ctx.push_handlers([
            Arc::new(|ctx: &mut Context| {
                ctx.next();
                ctx.next();
            }) as HandlerFunc,
            Arc::new(move |_: &mut Context| *counter.lock().unwrap() += 1) as HandlerFunc,
        ]);
        ctx.next();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_fail_skips_remaining_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context();
        ctx.push_handlers([
            Arc::new(|ctx: &mut Context| {
                ctx.fail(StatusCode::UNAUTHORIZED, "denied");
                ctx.next();
            }) as HandlerFunc,
            recorder(&log, "b", true),
        ]);
        ctx.next();

        assert!(log.lock().unwrap().is_empty());
        // parked at the end by `fail`, then moved one past it
        assert_eq!(ctx.index, 3);
        let res = ctx.into_response();
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.content_type(), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(body, json!({ "message": "denied" }));
    }

    #[test]
    fn test_query_and_form() {
        let req = crate::RequestBuilder::new("POST", "/login")
            .query("next=%2Fhome")
            .form("user=geek")
            .build();
        let ctx = Context::new(req);

        assert_eq!(ctx.query("next").as_deref(), Some("/home"));
        assert_eq!(ctx.post_form("user").as_deref(), Some("geek"));
        assert_eq!(ctx.param("id"), None);
    }

    #[test]
    fn test_string_and_data() {
        let mut ctx = context();
        ctx.string(StatusCode::OK, format!("hello {}", "geek"));
        ctx.data(StatusCode::CREATED, b"!");

        let res = ctx.into_response();
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.content_type(), Some("text/plain"));
        assert_eq!(res.body_string().as_deref(), Some("hello geek!"));
    }
}

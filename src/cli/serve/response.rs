//! HTTP response handlers.

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::embed::inject_hotreload;
use crate::embed::serve::{HOTRELOAD_JS, HotreloadVars};
use crate::html::escape;

const HTML: &str = "text/html; charset=utf-8";
const PLAIN: &str = "text/plain; charset=utf-8";
const JAVASCRIPT: &str = "text/javascript; charset=utf-8";

/// Respond with rendered markup, injecting the hotreload script when live.
pub fn respond_html(request: Request, status: u16, markup: String, live: bool) -> Result<()> {
    let body = if live {
        inject_hotreload(markup.as_bytes())
    } else {
        markup.into_bytes()
    };
    send_body(request, status, HTML, body)
}

/// Respond with hotreload.js from memory.
pub fn respond_hotreload_js(request: Request, ws_port: u16) -> Result<()> {
    let body = HOTRELOAD_JS.render(&HotreloadVars { ws_port });
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_body(request, 405, PLAIN, b"405 Method Not Allowed".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with a render failure (500). The page keeps the hotreload script
/// so fixing the template brings the view back.
pub fn respond_render_error(request: Request, error: &anyhow::Error, live: bool) -> Result<()> {
    respond_html(request, 500, render_error_page(error), live)
}

fn render_error_page(error: &anyhow::Error) -> String {
    let raw = format!("{error:#}");
    let msg = escape(&raw);
    format!("<html><body><h1>Render Error</h1><pre>{msg}</pre></body></html>")
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    if request.method() == &Method::Head {
        let response = Response::empty(StatusCode(status))
            .with_header(make_header("Content-Type", content_type));
        request.respond(response)?;
        return Ok(());
    }
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-store"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).expect("static header is valid ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_render_error_page_escapes_full_chain() {
        let error = Err::<(), _>(anyhow::anyhow!("missing value `<name>`"))
            .context("failed to render greeting")
            .unwrap_err();
        let page = render_error_page(&error);
        assert!(page.contains("failed to render greeting: missing value `&lt;name&gt;`"));
        assert!(page.ends_with("</pre></body></html>"));
    }
}

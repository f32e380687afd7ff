use axum::response::Html;

use crate::tools::registry::ToolRegistry;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Static documentation page for one endpoint, generated from its tool table.
pub fn render(title: &str, endpoint: &str, usage: &str, registry: &ToolRegistry) -> String {
    let mut rows = String::new();
    for tool in registry.descriptors() {
        let required = tool.required().collect::<Vec<_>>().join(", ");
        rows.push_str(&format!(
            "<tr><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
            escape(tool.name),
            escape(tool.description),
            escape(&required)
        ));
    }
    format!(
        "<!DOCTYPE html>\n\
         <html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n\
         <h1>{title}</h1>\n\
         <p>POST JSON-RPC 2.0 requests to <code>{endpoint}</code>. {usage}</p>\n\
         <p>Methods: <code>initialize</code>, <code>ping</code>, \
         <code>tools/list</code>, <code>tools/call</code>, \
         <code>resources/list</code>, <code>resources/read</code>.</p>\n\
         <table>\n<tr><th>Tool</th><th>Description</th><th>Required</th></tr>\n{rows}</table>\n\
         </body></html>\n",
        title = escape(title),
        endpoint = escape(endpoint),
        usage = escape(usage),
    )
}

pub async fn pocketbase() -> Html<String> {
    Html(render(
        "PocketBase MCP server",
        "/pocketbase",
        "Query parameters: url (required), token, or email and password.",
        &crate::tools::pocketbase::REGISTRY,
    ))
}

pub async fn mysql() -> Html<String> {
    Html(render(
        "MySQL MCP server",
        "/mysql",
        "Query parameters: host, port, dbname, user, pass.",
        &crate::tools::mysql::REGISTRY,
    ))
}

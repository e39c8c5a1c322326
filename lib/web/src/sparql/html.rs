use crate::state::Endpoint;
use axum::response::Html;
use serde_json::json;

/// Renders the query page of the endpoint.
///
/// The page is a plain form submitting to the endpoint itself. Example queries are embedded as
/// JSON and loaded into the editor when selected.
pub fn render_page(endpoint: &Endpoint) -> Html<String> {
    let examples = endpoint
        .example_queries
        .iter()
        .map(|example| json!({ "title": example.title, "query": example.query }))
        .collect::<Vec<_>>();
    let default_query = endpoint
        .example_queries
        .first()
        .map(|example| example.query.as_str())
        .unwrap_or("SELECT * WHERE {\n  ?s ?p ?o .\n} LIMIT 10");
    let options = endpoint
        .example_queries
        .iter()
        .enumerate()
        .map(|(i, example)| format!(r#"<option value="{i}">{}</option>"#, escape(&example.title)))
        .collect::<String>();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="icon" href="{favicon}">
  <style>
    body {{ font-family: sans-serif; margin: 2em auto; max-width: 60em; }}
    textarea {{ width: 100%; height: 20em; font-family: monospace; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <p>{description}</p>
  <form method="get" action="{path}">
    <p><select id="examples"><option value="">Example queries</option>{options}</select></p>
    <textarea id="query" name="query">{default_query}</textarea>
    <p>
      <select name="format" id="format">
        <option value="application/sparql-results+json">JSON</option>
        <option value="application/sparql-results+xml">XML</option>
        <option value="text/csv">CSV</option>
        <option value="text/tab-separated-values">TSV</option>
        <option value="text/turtle">Turtle</option>
      </select>
      <button type="submit">Run query</button>
    </p>
  </form>
  <pre id="results"></pre>
  <p><small>Version {version}</small></p>
  <script>
    const examples = {examples};
    document.getElementById("examples").addEventListener("change", (event) => {{
      const example = examples[event.target.value];
      if (example) document.getElementById("query").value = example.query;
    }});
    document.querySelector("form").addEventListener("submit", async (event) => {{
      event.preventDefault();
      const response = await fetch("{path}", {{
        method: "POST",
        headers: {{
          "Content-Type": "application/x-www-form-urlencoded",
          "Accept": document.getElementById("format").value,
        }},
        body: new URLSearchParams({{ query: document.getElementById("query").value }}),
      }});
      document.getElementById("results").textContent = await response.text();
    }});
  </script>
</body>
</html>
"#,
        title = escape(&endpoint.title),
        description = escape(&endpoint.description),
        favicon = escape(&endpoint.favicon),
        path = escape(&endpoint.path),
        version = escape(&endpoint.version),
        default_query = escape(default_query),
        examples = script_json(&serde_json::Value::Array(examples)),
    ))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JSON embedded in a `<script>` element must not close it.
fn script_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_hooks::functions::ExampleQuery;

    fn endpoint() -> Endpoint {
        Endpoint {
            path: "/sparql".to_owned(),
            title: "Hooks <test>".to_owned(),
            description: "Splits & joins".to_owned(),
            version: "0.1.0".to_owned(),
            public_url: "http://localhost:8000/sparql".to_owned(),
            favicon: "icon.svg".to_owned(),
            enable_update: false,
            api_key: None,
            union_default_graph: false,
            example_queries: vec![ExampleQuery {
                title: "Split".to_owned(),
                query: "SELECT ?x WHERE { BIND(\"</script>\" AS ?x) }".to_owned(),
            }],
            extension_functions: Vec::new(),
        }
    }

    #[test]
    fn escapes_the_page_metadata() {
        let Html(page) = render_page(&endpoint());
        assert!(page.contains("<title>Hooks &lt;test&gt;</title>"));
        assert!(page.contains("<p>Splits &amp; joins</p>"));
        assert!(page.contains(r#"<option value="0">Split</option>"#));
    }

    #[test]
    fn example_queries_cannot_close_the_script() {
        let Html(page) = render_page(&endpoint());
        assert_eq!(page.matches("</script>").count(), 1);
        assert!(page.contains(r#"<\/script>"#));
    }
}

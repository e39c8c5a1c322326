use itertools::Itertools;

const FENCE: &str = "```";

/// A query shown on the HTML page of the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleQuery {
    pub title: String,
    pub query: String,
}

/// Returns the first ` ```sparql ` block of a function documentation, without its common
/// indentation.
pub fn example_query(documentation: &str) -> Option<String> {
    let start = documentation.find("```sparql")?;
    let body = &documentation[start + "```sparql".len()..];
    let body = &body[body.find('\n')? + 1..];
    let body = &body[..body.find(FENCE)?];

    let lines = body.lines().collect::<Vec<_>>();
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()?;
    let query = lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or_default().trim_end())
        .join("\n");
    Some(query.trim().to_owned())
}

/// Turns a snake_case function name into a sentence: `split_index` becomes `Split index`.
pub fn example_title(name: &str) -> String {
    let sentence = name.split('_').filter(|word| !word.is_empty()).join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_sparql_block() {
        let documentation = "Splits a string.\n\n    ```sparql\n    SELECT ?x WHERE {\n        BIND(func:split(\"a b\") AS ?x)\n    }\n    ```\n\n```sparql\nASK {}\n```";
        insta::assert_snapshot!(example_query(documentation).unwrap(), @r#"
        SELECT ?x WHERE {
            BIND(func:split("a b") AS ?x)
        }
        "#);
    }

    #[test]
    fn documentation_without_a_query() {
        assert_eq!(example_query("Splits a string."), None);
        assert_eq!(example_query("```rust\nfn main() {}\n```"), None);
    }

    #[test]
    fn titles_are_sentences() {
        assert_eq!(example_title("split_index"), "Split index");
        assert_eq!(example_title("uri_splitter"), "Uri splitter");
        assert_eq!(example_title(""), "");
    }
}

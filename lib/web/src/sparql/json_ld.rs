//! A minimal [JSON-LD](https://www.w3.org/TR/json-ld11/) writer producing expanded documents.

use rdf_hooks::model::vocab::{rdf, xsd};
use rdf_hooks::model::{SubjectRef, TermRef, Triple};
use serde_json::{json, Map, Value};

/// Serializes triples as an expanded JSON-LD document: one node object per subject.
pub fn write_json_ld(triples: &[Triple]) -> Result<Vec<u8>, serde_json::Error> {
    let mut nodes = Map::new();
    for triple in triples {
        let id = node_id(triple.subject.as_ref());
        let node = nodes
            .entry(id.clone())
            .or_insert_with(|| json!({ "@id": id }));
        let Value::Object(node) = node else {
            continue;
        };
        let (key, value) = match triple.object.as_ref() {
            TermRef::NamedNode(object) if triple.predicate == rdf::TYPE => {
                ("@type".to_owned(), Value::String(object.as_str().to_owned()))
            }
            object => (triple.predicate.as_str().to_owned(), object_value(object)),
        };
        if let Value::Array(values) = node.entry(key).or_insert_with(|| json!([])) {
            values.push(value);
        }
    }
    serde_json::to_vec(&Value::Array(nodes.into_iter().map(|(_, node)| node).collect()))
}

fn node_id(subject: SubjectRef<'_>) -> String {
    match subject {
        SubjectRef::NamedNode(node) => node.as_str().to_owned(),
        other => other.to_string(),
    }
}

fn object_value(object: TermRef<'_>) -> Value {
    match object {
        TermRef::NamedNode(node) => json!({ "@id": node.as_str() }),
        TermRef::Literal(literal) => {
            if let Some(language) = literal.language() {
                json!({ "@value": literal.value(), "@language": language })
            } else if literal.datatype() == xsd::STRING {
                json!({ "@value": literal.value() })
            } else {
                json!({ "@value": literal.value(), "@type": literal.datatype().as_str() })
            }
        }
        other => json!({ "@id": other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_hooks::model::{BlankNode, Literal, NamedNode};

    #[test]
    fn groups_triples_by_subject() {
        let subject = NamedNode::new_unchecked("http://example.com/s");
        let triples = [
            Triple::new(
                subject.clone(),
                rdf::TYPE,
                NamedNode::new_unchecked("http://example.com/C"),
            ),
            Triple::new(
                subject.clone(),
                NamedNode::new_unchecked("http://example.com/p"),
                Literal::new_language_tagged_literal_unchecked("chat", "fr"),
            ),
            Triple::new(
                subject,
                NamedNode::new_unchecked("http://example.com/p"),
                Literal::from(1),
            ),
            Triple::new(
                BlankNode::new_unchecked("b"),
                NamedNode::new_unchecked("http://example.com/q"),
                Literal::new_simple_literal("x"),
            ),
        ];
        let document: Value = serde_json::from_slice(&write_json_ld(&triples).unwrap()).unwrap();
        assert_eq!(
            document,
            json!([
                {
                    "@id": "_:b",
                    "http://example.com/q": [{ "@value": "x" }]
                },
                {
                    "@id": "http://example.com/s",
                    "@type": ["http://example.com/C"],
                    "http://example.com/p": [
                        { "@value": "chat", "@language": "fr" },
                        { "@value": "1", "@type": "http://www.w3.org/2001/XMLSchema#integer" }
                    ]
                }
            ])
        );
    }
}

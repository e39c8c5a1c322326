//! The functions served by `rdf-hooks serve` and available to `rdf-hooks query`.

use rdf_hooks::functions::{
    FunctionArgs, FunctionDefinition, FunctionError, FunctionOutput, FunctionRegistry,
    LegacyCall, OutputShape, RegistrationError, Signature, StructValue,
};
use rdf_hooks::model::vocab::{dc, FUNC};
use rdf_hooks::model::{Graph, Literal, NamedNode, Term, Triple, Variable};

/// Identifier providers and the canonical IRI prefix of their identifiers.
const CANONICAL_PREFIXES: [(&str, &str); 4] = [
    (
        "https://identifiers.org/CHEBI/",
        "http://purl.obolibrary.org/obo/CHEBI_",
    ),
    (
        "https://identifiers.org/CHEBI:",
        "http://purl.obolibrary.org/obo/CHEBI_",
    ),
    (
        "https://identifiers.org/GO:",
        "http://purl.obolibrary.org/obo/GO_",
    ),
    (
        "https://identifiers.org/DOID:",
        "http://purl.obolibrary.org/obo/DOID_",
    ),
];

const OPENPREDICT: &str = "https://w3id.org/um/openpredict/";

pub fn demo_registry() -> Result<FunctionRegistry, RegistrationError> {
    let mut registry = FunctionRegistry::new();
    registry.register(
        FunctionDefinition::extension("split", split)
            .with_signature(splitter_signature(OutputShape::Multi, "input_str", " "))
            .with_documentation(
                r#"Split a string.

```sparql
PREFIX func: <https://w3id.org/sparql-functions/>
SELECT ?input ?part WHERE {
    VALUES ?input { "hello world" "cheese is good" }
    BIND(func:split(?input, " ") AS ?part)
}
```"#,
            ),
    )?;
    registry.register(
        FunctionDefinition::extension("split_index", split_index)
            .with_signature(splitter_signature(OutputShape::MultiStruct, "input_str", " "))
            .with_documentation(
                r#"Split a string and return each part with their index.

```sparql
PREFIX func: <https://w3id.org/sparql-functions/>
SELECT ?input ?part ?partIndex WHERE {
    VALUES ?input { "hello world" "cheese is good" }
    BIND(func:splitIndex(?input, " ") AS ?part)
}
```"#,
            ),
    )?;
    registry.register(
        FunctionDefinition::graph("split_graph", split_graph)
            .with_signature(splitter_signature(OutputShape::Graph, "input_str", " "))
            .with_documentation(
                r#"Split a string and return the results in a graph.

```sparql
PREFIX func: <https://w3id.org/sparql-functions/>
SELECT * WHERE {
    VALUES ?input { "hello world" "cheese is good" }
    BIND(func:splitGraph(?input, " ") AS ?g)
    GRAPH ?g {
        ?s ?p ?o .
    }
}
```"#,
            ),
    )?;
    registry.register(
        FunctionDefinition::type_pattern("string_splitter", string_splitter)
            .with_signature(splitter_signature(OutputShape::MultiStruct, "split_string", " "))
            .with_documentation(
                r#"Split a string and return each part with their index.

```sparql
PREFIX func: <https://w3id.org/sparql-functions/>
SELECT ?input ?part ?idx WHERE {
    VALUES ?input { "hello world" "cheese is good" }
    [] a func:StringSplitter ;
        func:splitString ?input ;
        func:separator " " ;
        func:splitted ?part ;
        func:index ?idx .
}
```"#,
            ),
    )?;
    registry.register(
        FunctionDefinition::type_pattern("uri_splitter", string_splitter)
            .with_signature(splitter_signature(OutputShape::MultiStruct, "split_string", "/"))
            .with_documentation(
                r#"Split a URI and return each part with their index.

```sparql
PREFIX func: <https://w3id.org/sparql-functions/>
SELECT ?part ?idx WHERE {
    [] a func:UriSplitter ;
        func:splitString <https://w3id.org/sparql-functions/split> ;
        func:splitted ?part ;
        func:index ?idx .
}
```"#,
            ),
    )?;
    registry.register(
        FunctionDefinition::predicate_pattern("identifier", identifier)
            .with_namespace(dc::NAMESPACE)
            .with_signature(Signature::new(OutputShape::Scalar).with_parameter("input_iri"))
            .with_documentation(
                r#"Get the standardized IRI for a given input IRI.

```sparql
PREFIX dc: <http://purl.org/dc/elements/1.1/>
SELECT ?id WHERE {
    <https://identifiers.org/CHEBI/1> dc:identifier ?id .
}
```"#,
            ),
    )?;
    registry.register_legacy(format!("{FUNC}custom_concat"), custom_concat)?;
    registry.register_legacy(format!("{OPENPREDICT}most_similar"), most_similar)?;
    Ok(registry)
}

fn splitter_signature(output: OutputShape, input: &str, separator: &str) -> Signature {
    Signature::new(output)
        .with_parameter(input)
        .with_default("separator", separator)
}

fn split(args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
    let input = args.str("input_str")?;
    let separator = args.str("separator")?;
    Ok(FunctionOutput::multi(input.split(separator)))
}

fn split_index(args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
    let input = args.str("input_str")?;
    let separator = args.str("separator")?;
    Ok(FunctionOutput::MultiStruct(
        input
            .split(separator)
            .enumerate()
            .map(|(index, part)| StructValue::new().with("value", part).with("index", index))
            .collect(),
    ))
}

fn split_graph(args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
    let input = args.str("input_str")?;
    let separator = args.str("separator")?;
    let subject = NamedNode::new_unchecked(format!("{FUNC}splitting"));
    let predicate = NamedNode::new_unchecked(format!("{FUNC}splitted"));
    let mut graph = Graph::new();
    for part in input.split(separator) {
        graph.insert(&Triple::new(
            subject.clone(),
            predicate.clone(),
            Literal::new_simple_literal(part),
        ));
    }
    Ok(graph.into())
}

fn string_splitter(args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
    let input = args.str("split_string")?;
    let separator = args.str("separator")?;
    Ok(FunctionOutput::MultiStruct(
        input
            .split(separator)
            .enumerate()
            .map(|(index, part)| {
                StructValue::new()
                    .with("splitted", part)
                    .with("index", index)
            })
            .collect(),
    ))
}

fn identifier(args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
    let iri = args.str("input_iri")?;
    CANONICAL_PREFIXES
        .iter()
        .find_map(|(provider, canonical)| {
            iri.strip_prefix(provider)
                .map(|id| NamedNode::new_unchecked(format!("{canonical}{id}")))
        })
        .map(FunctionOutput::scalar)
        .ok_or_else(|| FunctionError::failed(format!("No standardized IRI for {iri}")))
}

fn lexical(term: Term) -> Result<String, FunctionError> {
    match term {
        Term::Literal(literal) => Ok(literal.value().to_owned()),
        Term::NamedNode(node) => Ok(node.into_string()),
        Term::BlankNode(_) => Err(FunctionError::failed(
            "Blank nodes have no lexical form",
        )),
    }
}

/// Concatenates its two arguments both ways, binding the length of each result to
/// `?<variable>Length`.
fn custom_concat(mut call: LegacyCall<'_>) -> Result<LegacyCall<'_>, FunctionError> {
    let first = lexical(call.argument(0)?)?;
    let second = lexical(call.argument(1)?)?;
    let variable = call
        .variable()
        .cloned()
        .ok_or_else(|| FunctionError::failed("custom_concat must be called from BIND"))?;
    let length = Variable::new_unchecked(format!("{}Length", variable.as_str()));

    for concat in [format!("{first}{second}"), format!("{second}{first}")] {
        let size = i64::try_from(concat.chars().count()).unwrap_or(i64::MAX);
        call.push([
            (variable.clone(), Literal::new_simple_literal(concat).into()),
            (length.clone(), Literal::from(size).into()),
        ]);
    }
    Ok(call)
}

/// Returns the entities most similar to the argument, with their score in
/// `?<variable>Score`. Serves fixed data.
fn most_similar(mut call: LegacyCall<'_>) -> Result<LegacyCall<'_>, FunctionError> {
    let variable = call
        .variable()
        .cloned()
        .ok_or_else(|| FunctionError::failed("most_similar must be called from BIND"))?;
    let score = Variable::new_unchecked(format!("{}Score", variable.as_str()));
    for (entity, similarity) in [("DRUGBANK:DB00001", 0.42)] {
        call.push([
            (variable.clone(), Literal::new_simple_literal(entity).into()),
            (score.clone(), Literal::from(similarity).into()),
        ]);
    }
    Ok(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_hooks::sparql::{QueryOptions, QueryResults};
    use rdf_hooks::store::Store;
    use std::sync::Arc;

    fn select(query: &str) -> Vec<Vec<String>> {
        let options =
            QueryOptions::default().with_custom_evaluator(Arc::new(demo_registry().unwrap()));
        let QueryResults::Solutions(solutions) = Store::new().query_opt(query, &options).unwrap()
        else {
            panic!("SELECT query expected");
        };
        solutions
            .map(|solution| {
                solution
                    .unwrap()
                    .values()
                    .iter()
                    .map(|value| value.as_ref().map(ToString::to_string).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn registers_every_demo_function() {
        let registry = demo_registry().unwrap();
        assert_eq!(registry.extension_function_iris().len(), 5);
        assert_eq!(registry.example_queries().len(), 6);
    }

    #[test]
    fn identifiers_are_standardized() {
        let rows = select(
            "PREFIX dc: <http://purl.org/dc/elements/1.1/>
            SELECT ?id WHERE { <https://identifiers.org/CHEBI/1> dc:identifier ?id }",
        );
        assert_eq!(rows, [["<http://purl.obolibrary.org/obo/CHEBI_1>"]]);
    }

    #[test]
    fn uri_splitter_splits_on_slashes() {
        let rows = select(
            "PREFIX func: <https://w3id.org/sparql-functions/>
            SELECT ?part WHERE {
                [] a func:UriSplitter ; func:splitString \"a/b\" ; func:splitted ?part .
            }",
        );
        assert_eq!(rows, [["\"a\""], ["\"b\""]]);
    }

    #[test]
    fn most_similar_binds_a_score() {
        let rows = select(
            "PREFIX openpredict: <https://w3id.org/um/openpredict/>
            SELECT ?similar ?similarScore WHERE {
                BIND(openpredict:most_similar(\"OMIM:246300\") AS ?similar)
            }",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "\"DRUGBANK:DB00001\"");
    }
}

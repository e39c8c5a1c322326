use crate::error::RdfHooksServerError;
use crate::state::Endpoint;
use anyhow::anyhow;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rdf_hooks::io::{RdfFormat, RdfSerializer};
use rdf_hooks::model::vocab::{dc, ent, formats, rdf, rdfs, sd, void};
use rdf_hooks::model::{
    BlankNode, Graph, GraphNameRef, Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, Term,
    Triple,
};
use rdf_hooks::store::Store;

const RESULT_FORMATS: [NamedNodeRef<'static>; 8] = [
    formats::SPARQL_RESULTS_JSON,
    formats::SPARQL_RESULTS_XML,
    formats::SPARQL_RESULTS_CSV,
    formats::SPARQL_RESULTS_TSV,
    formats::TURTLE,
    formats::RDF_XML,
    formats::N_TRIPLES,
    formats::JSON_LD,
];

const INPUT_FORMATS: [NamedNodeRef<'static>; 6] = [
    formats::RDF_XML,
    formats::TURTLE,
    formats::JSON_LD,
    formats::N_TRIPLES,
    formats::N_QUADS,
    formats::TRIG,
];

/// A serialized service description.
pub struct ServiceDescription {
    media_type: &'static str,
    description: Vec<u8>,
}

impl IntoResponse for ServiceDescription {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(CONTENT_TYPE, self.media_type)],
            self.description,
        )
            .into_response()
    }
}

/// Serializes the service description as Turtle or RDF/XML.
pub fn generate_service_description(
    endpoint: &Endpoint,
    store: &Store,
    format: RdfFormat,
    media_type: &'static str,
) -> Result<ServiceDescription, RdfHooksServerError> {
    let graph = describe_service(endpoint, store)?;
    let mut serializer = RdfSerializer::from_format(format);
    for (prefix, namespace) in [
        ("sd", sd::NAMESPACE),
        ("dc", dc::NAMESPACE),
        ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
        ("ent", "http://www.w3.org/ns/entailment/"),
        ("void", "http://rdfs.org/ns/void#"),
        ("formats", formats::NAMESPACE),
    ] {
        serializer = serializer
            .with_prefix(prefix, namespace)
            .map_err(|e| RdfHooksServerError::Internal(anyhow!(e)))?;
    }
    let mut serializer = serializer.for_writer(Vec::new());
    for triple in &graph {
        serializer
            .serialize_triple(triple)
            .map_err(|e| RdfHooksServerError::Internal(anyhow!(e)))?;
    }
    let description = serializer
        .finish()
        .map_err(|e| RdfHooksServerError::Internal(anyhow!(e)))?;
    Ok(ServiceDescription {
        media_type,
        description,
    })
}

/// Builds the [SPARQL 1.1 service description](https://www.w3.org/TR/sparql11-service-description/)
/// of the endpoint.
///
/// The description is recomputed on each call: the dataset part counts the triples of the
/// default graph and of every named graph of the store.
pub fn describe_service(endpoint: &Endpoint, store: &Store) -> Result<Graph, RdfHooksServerError> {
    let service = NamedNode::new(&endpoint.public_url).map_err(|e| {
        RdfHooksServerError::Internal(anyhow!("Invalid public URL {}: {e}", endpoint.public_url))
    })?;
    let service_node = NamedOrBlankNode::from(service.clone());
    let mut graph = Graph::new();

    add(&mut graph, &service_node, rdf::TYPE, sd::SERVICE.into_owned());
    add(&mut graph, &service_node, sd::ENDPOINT, service);
    add(
        &mut graph,
        &service_node,
        rdfs::LABEL,
        Literal::new_simple_literal(&endpoint.title),
    );
    add(
        &mut graph,
        &service_node,
        dc::DESCRIPTION,
        Literal::new_simple_literal(&endpoint.description),
    );
    add(
        &mut graph,
        &service_node,
        sd::SUPPORTED_LANGUAGE,
        sd::SPARQL_11_QUERY.into_owned(),
    );
    if endpoint.enable_update {
        add(
            &mut graph,
            &service_node,
            sd::SUPPORTED_LANGUAGE,
            sd::SPARQL_11_UPDATE.into_owned(),
        );
    }
    if endpoint.union_default_graph {
        add(
            &mut graph,
            &service_node,
            sd::FEATURE,
            sd::UNION_DEFAULT_GRAPH.into_owned(),
        );
    }
    for format in RESULT_FORMATS {
        add(&mut graph, &service_node, sd::RESULT_FORMAT, format.into_owned());
    }
    for format in INPUT_FORMATS {
        add(&mut graph, &service_node, sd::INPUT_FORMAT, format.into_owned());
    }
    add(
        &mut graph,
        &service_node,
        sd::DEFAULT_ENTAILMENT_REGIME,
        ent::SIMPLE.into_owned(),
    );

    let dataset = NamedOrBlankNode::from(BlankNode::new_unchecked("dataset"));
    add(&mut graph, &service_node, sd::DEFAULT_DATASET, dataset.clone());
    add(&mut graph, &dataset, rdf::TYPE, sd::DATASET.into_owned());

    let default_graph = NamedOrBlankNode::from(BlankNode::new_unchecked("defaultGraph"));
    add(&mut graph, &dataset, sd::DEFAULT_GRAPH, default_graph.clone());
    add(&mut graph, &default_graph, rdf::TYPE, sd::GRAPH_CLASS.into_owned());
    add(
        &mut graph,
        &default_graph,
        void::TRIPLES,
        triple_count(store, GraphNameRef::DefaultGraph)?,
    );

    let named_graphs = store
        .named_graphs()
        .map_err(|e| RdfHooksServerError::Internal(anyhow!(e)))?;
    for (index, name) in named_graphs.into_iter().enumerate() {
        let named_graph =
            NamedOrBlankNode::from(BlankNode::new_unchecked(format!("namedGraph{index}")));
        let graph_node = NamedOrBlankNode::from(BlankNode::new_unchecked(format!("graph{index}")));
        let count = triple_count(store, name.as_ref().into())?;
        add(&mut graph, &dataset, sd::NAMED_GRAPH, named_graph.clone());
        add(&mut graph, &named_graph, rdf::TYPE, sd::NAMED_GRAPH_CLASS.into_owned());
        add(&mut graph, &named_graph, sd::NAME, name);
        add(&mut graph, &named_graph, sd::GRAPH, graph_node.clone());
        add(&mut graph, &graph_node, rdf::TYPE, sd::GRAPH_CLASS.into_owned());
        add(&mut graph, &graph_node, void::TRIPLES, count);
    }

    for function in &endpoint.extension_functions {
        let function_node = NamedOrBlankNode::from(function.clone());
        add(&mut graph, &function_node, rdf::TYPE, sd::FUNCTION.into_owned());
        add(
            &mut graph,
            &service_node,
            sd::EXTENSION_FUNCTION,
            function.clone(),
        );
    }
    Ok(graph)
}

fn add(
    graph: &mut Graph,
    subject: &NamedOrBlankNode,
    predicate: NamedNodeRef<'_>,
    object: impl Into<Term>,
) {
    graph.insert(&Triple::new(
        subject.clone(),
        predicate.into_owned(),
        object.into(),
    ));
}

fn triple_count(store: &Store, graph_name: GraphNameRef<'_>) -> Result<Literal, RdfHooksServerError> {
    let count = store
        .quads_for_pattern(None, None, None, Some(graph_name))
        .map_err(|e| RdfHooksServerError::Internal(anyhow!(e)))?
        .len();
    Ok(Literal::from(i64::try_from(count).unwrap_or(i64::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_PUBLIC_URL, DEFAULT_TITLE};
    use rdf_hooks::model::QuadRef;

    fn endpoint() -> Endpoint {
        Endpoint {
            path: "/sparql".to_owned(),
            title: DEFAULT_TITLE.to_owned(),
            description: "A test endpoint".to_owned(),
            version: "0.1.0".to_owned(),
            public_url: DEFAULT_PUBLIC_URL.to_owned(),
            favicon: String::new(),
            enable_update: true,
            api_key: None,
            union_default_graph: true,
            example_queries: Vec::new(),
            extension_functions: vec![NamedNode::new_unchecked(
                "https://w3id.org/sparql-functions/split",
            )],
        }
    }

    fn store() -> Store {
        let store = Store::new();
        let ex = NamedNodeRef::new_unchecked("http://example.com/s");
        let graph = NamedNodeRef::new_unchecked("http://example.com/g");
        for quad in [
            QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph),
            QuadRef::new(ex, ex, ex, graph),
            QuadRef::new(ex, ex, graph, graph),
        ] {
            store.insert(quad).unwrap();
        }
        store
    }

    #[test]
    fn describes_the_endpoint() {
        let graph = describe_service(&endpoint(), &store()).unwrap();
        let mut lines = graph.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        lines.sort();
        insta::assert_snapshot!(lines.join("\n"), @r#"
        <https://w3id.org/sparql-functions/split> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/sparql-service-description#Function>
        <https://your-endpoint/sparql> <http://purl.org/dc/elements/1.1/description> "A test endpoint"
        <https://your-endpoint/sparql> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/sparql-service-description#Service>
        <https://your-endpoint/sparql> <http://www.w3.org/2000/01/rdf-schema#label> "SPARQL endpoint for RDF hooks"
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#defaultDataset> _:dataset
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#defaultEntailmentRegime> <http://www.w3.org/ns/entailment/Simple>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#endpoint> <https://your-endpoint/sparql>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#extensionFunction> <https://w3id.org/sparql-functions/split>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#feature> <http://www.w3.org/ns/sparql-service-description#UnionDefaultGraph>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#inputFormat> <http://www.w3.org/ns/formats/JSON-LD>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#inputFormat> <http://www.w3.org/ns/formats/N-Quads>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#inputFormat> <http://www.w3.org/ns/formats/N-Triples>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#inputFormat> <http://www.w3.org/ns/formats/RDF_XML>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#inputFormat> <http://www.w3.org/ns/formats/TriG>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#inputFormat> <http://www.w3.org/ns/formats/Turtle>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#resultFormat> <http://www.w3.org/ns/formats/JSON-LD>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#resultFormat> <http://www.w3.org/ns/formats/N-Triples>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#resultFormat> <http://www.w3.org/ns/formats/RDF_XML>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#resultFormat> <http://www.w3.org/ns/formats/SPARQL_Results_CSV>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#resultFormat> <http://www.w3.org/ns/formats/SPARQL_Results_JSON>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#resultFormat> <http://www.w3.org/ns/formats/SPARQL_Results_TSV>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#resultFormat> <http://www.w3.org/ns/formats/SPARQL_Results_XML>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#resultFormat> <http://www.w3.org/ns/formats/Turtle>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#supportedLanguage> <http://www.w3.org/ns/sparql-service-description#SPARQL11Query>
        <https://your-endpoint/sparql> <http://www.w3.org/ns/sparql-service-description#supportedLanguage> <http://www.w3.org/ns/sparql-service-description#SPARQL11Update>
        _:dataset <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/sparql-service-description#Dataset>
        _:dataset <http://www.w3.org/ns/sparql-service-description#defaultGraph> _:defaultGraph
        _:dataset <http://www.w3.org/ns/sparql-service-description#namedGraph> _:namedGraph0
        _:defaultGraph <http://rdfs.org/ns/void#triples> "1"^^<http://www.w3.org/2001/XMLSchema#integer>
        _:defaultGraph <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/sparql-service-description#Graph>
        _:graph0 <http://rdfs.org/ns/void#triples> "2"^^<http://www.w3.org/2001/XMLSchema#integer>
        _:graph0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/sparql-service-description#Graph>
        _:namedGraph0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/sparql-service-description#NamedGraph>
        _:namedGraph0 <http://www.w3.org/ns/sparql-service-description#graph> _:graph0
        _:namedGraph0 <http://www.w3.org/ns/sparql-service-description#name> <http://example.com/g>
        "#);
    }

    #[test]
    fn updates_are_advertised_only_when_enabled() {
        let mut endpoint = endpoint();
        endpoint.enable_update = false;
        endpoint.union_default_graph = false;
        let graph = describe_service(&endpoint, &Store::new()).unwrap();
        let service = NamedNodeRef::new_unchecked(DEFAULT_PUBLIC_URL);
        assert_eq!(
            graph
                .objects_for_subject_predicate(service, sd::SUPPORTED_LANGUAGE)
                .count(),
            1
        );
        assert_eq!(
            graph
                .objects_for_subject_predicate(service, sd::FEATURE)
                .count(),
            0
        );
    }

    #[test]
    fn serializes_as_turtle() {
        let description = generate_service_description(
            &endpoint(),
            &Store::new(),
            RdfFormat::Turtle,
            "text/turtle",
        )
        .unwrap();
        let text = String::from_utf8(description.description).unwrap();
        assert!(text.contains("@prefix sd: <http://www.w3.org/ns/sparql-service-description#> ."));
        assert!(text.contains("<https://your-endpoint/sparql>"));
    }
}

//! Vocabularies used by the hooks, the service description and the demo functions.

pub use oxrdf::vocab::{rdf, rdfs, xsd};

/// The default namespace of the registered functions.
pub const FUNC: &str = "https://w3id.org/sparql-functions/";

pub mod dc {
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

    pub const DESCRIPTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/elements/1.1/description");
    pub const IDENTIFIER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/elements/1.1/identifier");
}

pub mod owl {
    pub const NAMESPACE: &str = "http://www.w3.org/2002/07/owl#";
}

pub mod void {
    use oxrdf::NamedNodeRef;

    pub const TRIPLES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#triples");
}

pub mod ent {
    use oxrdf::NamedNodeRef;

    pub const SIMPLE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/entailment/Simple");
}

/// [SPARQL 1.1 Service Description](https://www.w3.org/TR/sparql11-service-description/)
pub mod sd {
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/ns/sparql-service-description#";

    pub const SERVICE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#Service",
    );
    pub const FUNCTION: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#Function",
    );
    pub const DATASET: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#Dataset",
    );
    pub const GRAPH_CLASS: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#Graph",
    );
    pub const NAMED_GRAPH_CLASS: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#NamedGraph",
    );

    pub const DEFAULT_DATASET: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#defaultDataset",
    );
    pub const DEFAULT_ENTAILMENT_REGIME: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#defaultEntailmentRegime",
    );
    pub const DEFAULT_GRAPH: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#defaultGraph",
    );
    pub const ENDPOINT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#endpoint",
    );
    pub const EXTENSION_FUNCTION: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#extensionFunction",
    );
    pub const FEATURE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#feature",
    );
    pub const GRAPH: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#graph",
    );
    pub const INPUT_FORMAT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#inputFormat",
    );
    pub const NAME: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#name",
    );
    pub const NAMED_GRAPH: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#namedGraph",
    );
    pub const RESULT_FORMAT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#resultFormat",
    );
    pub const SUPPORTED_LANGUAGE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#supportedLanguage",
    );

    pub const SPARQL_11_QUERY: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#SPARQL11Query",
    );
    pub const SPARQL_11_UPDATE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#SPARQL11Update",
    );
    pub const UNION_DEFAULT_GRAPH: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/ns/sparql-service-description#UnionDefaultGraph",
    );
}

/// [Unique URIs for file formats](https://www.w3.org/ns/formats/)
pub mod formats {
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/ns/formats/";

    pub const JSON_LD: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/JSON-LD");
    pub const N_QUADS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/N-Quads");
    pub const N_TRIPLES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/N-Triples");
    pub const RDF_XML: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/RDF_XML");
    pub const SPARQL_RESULTS_CSV: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/SPARQL_Results_CSV");
    pub const SPARQL_RESULTS_JSON: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/SPARQL_Results_JSON");
    pub const SPARQL_RESULTS_TSV: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/SPARQL_Results_TSV");
    pub const SPARQL_RESULTS_XML: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/SPARQL_Results_XML");
    pub const TRIG: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/TriG");
    pub const TURTLE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/formats/Turtle");
}

use mediatype::MediaType;
use rdf_hooks::io::RdfFormat;
use rdf_hooks::sparql::QueryResultsFormat;
use std::cmp::Ordering;

/// The media type returned when nothing in the `Accept` header is supported.
pub const DEFAULT_MEDIA_TYPE: &str = "application/xml";

/// A serialization of CONSTRUCT and DESCRIBE results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphFormat {
    Rdf(RdfFormat),
    JsonLd,
}

/// Accepted media type, format, and the media type of the response.
const SOLUTION_FORMATS: [(&str, QueryResultsFormat, &str); 10] = [
    (
        "application/sparql-results+json",
        QueryResultsFormat::Json,
        "application/sparql-results+json",
    ),
    ("application/json", QueryResultsFormat::Json, "application/json"),
    ("text/json", QueryResultsFormat::Json, "application/json"),
    (
        "application/sparql-results+xml",
        QueryResultsFormat::Xml,
        "application/sparql-results+xml",
    ),
    ("application/xml", QueryResultsFormat::Xml, "application/xml"),
    ("text/xml", QueryResultsFormat::Xml, "application/xml"),
    (
        "application/sparql-results+csv",
        QueryResultsFormat::Csv,
        "application/sparql-results+csv",
    ),
    ("text/csv", QueryResultsFormat::Csv, "text/csv"),
    (
        "text/tab-separated-values",
        QueryResultsFormat::Tsv,
        "text/tab-separated-values",
    ),
    (
        "application/sparql-results+tsv",
        QueryResultsFormat::Tsv,
        "application/sparql-results+tsv",
    ),
];

const GRAPH_FORMATS: [(&str, GraphFormat, &str); 14] = [
    ("text/turtle", GraphFormat::Rdf(RdfFormat::Turtle), "text/turtle"),
    ("text/n3", GraphFormat::Rdf(RdfFormat::N3), "text/n3"),
    (
        "application/rdf+xml",
        GraphFormat::Rdf(RdfFormat::RdfXml),
        "application/rdf+xml",
    ),
    ("application/ld+json", GraphFormat::JsonLd, "application/ld+json"),
    (
        "application/n-triples",
        GraphFormat::Rdf(RdfFormat::NTriples),
        "application/n-triples",
    ),
    ("text/plain", GraphFormat::Rdf(RdfFormat::NTriples), "text/plain"),
    ("application/trig", GraphFormat::Rdf(RdfFormat::TriG), "application/trig"),
    (
        "application/n-quads",
        GraphFormat::Rdf(RdfFormat::NQuads),
        "application/n-quads",
    ),
    ("application/json", GraphFormat::JsonLd, "application/ld+json"),
    ("text/json", GraphFormat::JsonLd, "application/ld+json"),
    ("text/csv", GraphFormat::Rdf(RdfFormat::Turtle), "text/turtle"),
    (
        "application/sparql-results+csv",
        GraphFormat::Rdf(RdfFormat::Turtle),
        "text/turtle",
    ),
    ("application/xml", GraphFormat::Rdf(RdfFormat::RdfXml), "application/xml"),
    ("text/xml", GraphFormat::Rdf(RdfFormat::RdfXml), "application/xml"),
];

/// Parses an `Accept` header into media types, most preferred first.
///
/// An entry with a `q` parameter gets that preference. Entries without one get `2.0` minus
/// `0.01` per position, so they outrank every explicitly weighted entry while keeping their
/// order. Ties keep the order of the header.
pub fn parse_accept_header(accept: &str) -> Vec<String> {
    let mut preferences = accept
        .split(',')
        .enumerate()
        .filter_map(|(position, entry)| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            #[allow(clippy::cast_precision_loss, reason = "Header positions are small")]
            let implicit = 2.0 - 0.01 * position as f64;
            Some(match MediaType::parse(entry) {
                Ok(media_type) => {
                    let preference = media_type
                        .params
                        .iter()
                        .find(|(name, _)| name.as_str().eq_ignore_ascii_case("q"))
                        .map_or(implicit, |(_, value)| {
                            value.as_str().trim().parse().unwrap_or(1.0)
                        });
                    (media_type.essence().to_string().to_ascii_lowercase(), preference)
                }
                Err(_) => (fallback_essence(entry), implicit),
            })
        })
        .collect::<Vec<_>>();
    preferences.sort_by(|(_, left), (_, right)| {
        right.partial_cmp(left).unwrap_or(Ordering::Equal)
    });
    preferences
        .into_iter()
        .map(|(media_type, _)| media_type)
        .collect()
}

fn fallback_essence(entry: &str) -> String {
    entry
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Picks the serialization of SELECT and ASK results.
pub fn negotiate_solutions(accept: &[String]) -> (QueryResultsFormat, &'static str) {
    accept
        .iter()
        .find_map(|media_type| {
            SOLUTION_FORMATS
                .iter()
                .find(|(accepted, _, _)| *accepted == media_type.as_str())
                .map(|(_, format, content_type)| (*format, *content_type))
        })
        .unwrap_or((QueryResultsFormat::Xml, DEFAULT_MEDIA_TYPE))
}

/// Picks the serialization of CONSTRUCT and DESCRIBE results.
pub fn negotiate_graph(accept: &[String]) -> (GraphFormat, &'static str) {
    accept
        .iter()
        .find_map(|media_type| {
            GRAPH_FORMATS
                .iter()
                .find(|(accepted, _, _)| *accepted == media_type.as_str())
                .map(|(_, format, content_type)| (*format, *content_type))
        })
        .unwrap_or((GraphFormat::Rdf(RdfFormat::RdfXml), DEFAULT_MEDIA_TYPE))
}

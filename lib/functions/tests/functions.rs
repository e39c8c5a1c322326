use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::sparql::{
    evaluate_query, evaluate_update, Query, QueryOptions, QueryResults, QuerySolution,
    QuerySolutionIter, Update,
};
use rdf_hooks_engine::{MemoryQuadStorage, QuadStorage};
use rdf_hooks_functions::{
    FunctionArgs, FunctionDefinition, FunctionError, FunctionOutput, FunctionRegistry,
    LegacyCall, OutputShape, Signature, StructValue,
};
use rdf_hooks_model::vocab::{rdf, FUNC};
use rdf_hooks_model::{Graph, Literal, NamedNode, Term, Triple, Variable};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DC: &str = "http://purl.org/dc/elements/1.1/";
const CHEBI: &str = "https://identifiers.org/CHEBI/";
const OBO: &str = "http://purl.obolibrary.org/obo/CHEBI_";

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
    let mut graph = Graph::new();
    for (index, part) in input.split(' ').enumerate() {
        graph.insert(&Triple::new(
            NamedNode::new_unchecked(format!("urn:split:{index}")),
            rdf::VALUE,
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
    let iri = args.str("iri")?;
    let id = iri
        .strip_prefix(CHEBI)
        .ok_or_else(|| FunctionError::failed(format!("No known identifier for {iri}")))?;
    Ok(FunctionOutput::scalar(NamedNode::new_unchecked(format!("{OBO}{id}"))))
}

fn checker(args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
    match args.str("input")? {
        "bad" => Err(FunctionError::failed("bad input")),
        input => Ok(FunctionOutput::scalar(format!("ok-{input}"))),
    }
}

fn fail(_: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
    Err(FunctionError::failed("boom"))
}

fn lexical(term: &Term) -> Result<String, FunctionError> {
    match term {
        Term::Literal(literal) => Ok(literal.value().to_owned()),
        Term::NamedNode(node) => Ok(node.as_str().to_owned()),
        Term::BlankNode(_) => Err(FunctionError::failed("Blank nodes cannot be concatenated")),
    }
}

fn custom_concat(mut call: LegacyCall<'_>) -> Result<LegacyCall<'_>, FunctionError> {
    let first = lexical(&call.argument(0)?)?;
    let second = lexical(&call.argument(1)?)?;
    let variable = call
        .variable()
        .cloned()
        .ok_or_else(|| FunctionError::failed("Missing variable"))?;
    let length = Variable::new_unchecked(format!("{}Length", variable.as_str()));

    for concat in [format!("{first}{second}"), format!("{second}{first}")] {
        let size = i64::try_from(concat.len()).unwrap_or(i64::MAX);
        call.push([
            (variable.clone(), Literal::new_simple_literal(concat).into()),
            (length.clone(), Literal::from(size).into()),
        ]);
    }
    Ok(call)
}

fn registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    let text = || {
        Signature::new(OutputShape::Multi)
            .with_parameter("input_str")
            .with_default("separator", " ")
    };
    registry
        .register(FunctionDefinition::extension("split", split).with_signature(text()))
        .unwrap();
    registry
        .register(
            FunctionDefinition::extension("split_index", split_index).with_signature(
                Signature::new(OutputShape::MultiStruct)
                    .with_parameter("input_str")
                    .with_default("separator", " "),
            ),
        )
        .unwrap();
    registry
        .register(
            FunctionDefinition::graph("split_graph", split_graph).with_signature(
                Signature::new(OutputShape::Graph).with_parameter("input_str"),
            ),
        )
        .unwrap();
    registry
        .register(
            FunctionDefinition::type_pattern("string_splitter", string_splitter).with_signature(
                Signature::new(OutputShape::MultiStruct)
                    .with_parameter("split_string")
                    .with_default("separator", " "),
            ),
        )
        .unwrap();
    registry
        .register(
            FunctionDefinition::type_pattern("checker", checker)
                .with_signature(Signature::new(OutputShape::Scalar).with_parameter("input")),
        )
        .unwrap();
    registry
        .register(
            FunctionDefinition::predicate_pattern("identifier", identifier)
                .with_namespace(DC)
                .with_signature(Signature::new(OutputShape::Scalar).with_parameter("iri")),
        )
        .unwrap();
    registry
        .register(FunctionDefinition::extension("fail", fail))
        .unwrap();
    registry
        .register_legacy(format!("{FUNC}custom_concat"), custom_concat)
        .unwrap();
    registry
}

fn options() -> QueryOptions {
    QueryOptions::default().with_custom_evaluator(Arc::new(registry()))
}

fn storage(data: &str) -> Arc<dyn QuadStorage> {
    let storage: Arc<dyn QuadStorage> = Arc::new(MemoryQuadStorage::new());
    if !data.is_empty() {
        let update = Update::parse(data, None).unwrap();
        evaluate_update(Arc::clone(&storage), &update, &options().into()).unwrap();
    }
    storage
}

fn try_select(
    storage: &Arc<dyn QuadStorage>,
    query: &str,
) -> Result<Vec<QuerySolution>, QueryEvaluationError> {
    let query = Query::parse(&format!("PREFIX func: <{FUNC}>\n{query}"), None).unwrap();
    let QueryResults::Solutions(solutions) =
        evaluate_query(Arc::clone(storage), &query, &options())?
    else {
        panic!("Expected solutions");
    };
    solutions.collect()
}

fn lazy_select(storage: &Arc<dyn QuadStorage>, query: &str) -> QuerySolutionIter {
    let query = Query::parse(&format!("PREFIX func: <{FUNC}>\n{query}"), None).unwrap();
    let QueryResults::Solutions(solutions) =
        evaluate_query(Arc::clone(storage), &query, &options()).unwrap()
    else {
        panic!("Expected solutions");
    };
    solutions
}

fn select(query: &str) -> Vec<QuerySolution> {
    try_select(&storage(""), query).unwrap()
}

fn iri(value: impl Into<String>) -> Option<Term> {
    Some(NamedNode::new_unchecked(value).into())
}

fn literal(value: &str) -> Option<Term> {
    Some(Literal::new_simple_literal(value).into())
}

fn integer(value: i64) -> Option<Term> {
    Some(Literal::from(value).into())
}

fn column(solutions: &[QuerySolution], variable: &str) -> Vec<Option<Term>> {
    solutions
        .iter()
        .map(|solution| solution.get(variable).cloned())
        .collect()
}

#[test]
fn extension_returns_one_row_per_value() {
    let solutions = select(r#"SELECT ?part WHERE { BIND(func:split("a b c") AS ?part) }"#);
    assert_eq!(
        column(&solutions, "part"),
        vec![literal("a"), literal("b"), literal("c")]
    );
}

#[test]
fn extension_arguments_override_defaults() {
    let solutions = select(r#"SELECT ?part WHERE { BIND(func:split("a,b", ",") AS ?part) }"#);
    assert_eq!(column(&solutions, "part"), vec![literal("a"), literal("b")]);
}

#[test]
fn extension_arguments_come_from_the_solution() {
    let solutions = select(
        r#"SELECT ?part WHERE { VALUES ?text { "x y" } BIND(func:split(?text) AS ?part) }"#,
    );
    assert_eq!(column(&solutions, "part"), vec![literal("x"), literal("y")]);
}

#[test]
fn struct_fields_fan_out_into_variables() {
    let solutions =
        select(r#"SELECT ?part ?partIndex WHERE { BIND(func:splitIndex("hello world") AS ?part) }"#);
    assert_eq!(
        column(&solutions, "part"),
        vec![literal("hello"), literal("world")]
    );
    assert_eq!(column(&solutions, "partIndex"), vec![integer(0), integer(1)]);
}

#[test]
fn graph_functions_fill_a_temporary_graph() {
    let storage = storage("");
    let solutions = try_select(
        &storage,
        r#"SELECT ?g ?s ?o WHERE {
            BIND(func:splitGraph("a b") AS ?g)
            GRAPH ?g { ?s ?p ?o }
        } ORDER BY ?o"#,
    )
    .unwrap();
    let graph = Term::from(NamedNode::new_unchecked(format!("{FUNC}graph/split_graph")));
    assert_eq!(
        column(&solutions, "g"),
        vec![Some(graph.clone()), Some(graph)]
    );
    assert_eq!(column(&solutions, "o"), vec![literal("a"), literal("b")]);
    assert_eq!(storage.len().unwrap(), 0);
    assert!(storage.named_graphs().unwrap().is_empty());
}

#[test]
fn graph_function_graphs_are_purged_when_the_query_fails() {
    let storage = storage("");
    let result = try_select(
        &storage,
        r#"SELECT ?o ?x WHERE {
            BIND(func:splitGraph("a b") AS ?g)
            GRAPH ?g { ?s ?p ?o }
            BIND(func:fail() AS ?x)
        }"#,
    );
    assert!(matches!(result, Err(QueryEvaluationError::Function { .. })));
    assert_eq!(storage.len().unwrap(), 0);
    assert!(storage.named_graphs().unwrap().is_empty());

    let solutions = try_select(
        &storage,
        r#"SELECT ?o WHERE { BIND(func:splitGraph("c") AS ?g) GRAPH ?g { ?s ?p ?o } }"#,
    )
    .unwrap();
    assert_eq!(column(&solutions, "o"), vec![literal("c")]);
}

#[test]
fn graph_function_graphs_are_private_to_each_query() {
    let storage = storage("");
    // The second pattern is looked up once per row, after the other query ran.
    let mut first = lazy_select(
        &storage,
        r#"SELECT ?o WHERE {
            BIND(func:splitGraph("a b") AS ?g)
            GRAPH ?g { ?s ?p ?o . ?s ?p ?o }
        }"#,
    );
    let first_row = first.next().unwrap().unwrap();

    let second = try_select(
        &storage,
        r#"SELECT ?o WHERE {
            BIND(func:splitGraph("c d e") AS ?g)
            GRAPH ?g { ?s ?p ?o }
        } ORDER BY ?o"#,
    )
    .unwrap();
    assert_eq!(
        column(&second, "o"),
        vec![literal("c"), literal("d"), literal("e")]
    );

    let mut objects = vec![first_row.get("o").cloned()];
    for solution in first {
        objects.push(solution.unwrap().get("o").cloned());
    }
    objects.sort_by_key(|object| object.as_ref().map(ToString::to_string));
    assert_eq!(objects, vec![literal("a"), literal("b")]);
    assert_eq!(storage.len().unwrap(), 0);
}

#[test]
fn concurrent_graph_function_queries_do_not_interfere() {
    let storage = storage("");
    std::thread::scope(|scope| {
        for (input, expected) in [("a b", 2), ("c d e", 3), ("f", 1)] {
            let storage = &storage;
            scope.spawn(move || {
                let query = format!(
                    r#"SELECT ?o WHERE {{
                        BIND(func:splitGraph("{input}") AS ?g)
                        GRAPH ?g {{ ?s ?p ?o }}
                    }}"#
                );
                for _ in 0..50 {
                    assert_eq!(try_select(storage, &query).unwrap().len(), expected);
                }
            });
        }
    });
    assert_eq!(storage.len().unwrap(), 0);
}

#[test]
fn type_patterns_bind_struct_fields() {
    let solutions = select(
        r#"SELECT ?part ?idx WHERE {
            [] a func:StringSplitter ;
                func:splitString "hello world" ;
                func:splitted ?part ;
                func:index ?idx .
        } ORDER BY ?idx"#,
    );
    assert_eq!(
        column(&solutions, "part"),
        vec![literal("hello"), literal("world")]
    );
    assert_eq!(column(&solutions, "idx"), vec![integer(0), integer(1)]);
}

#[test]
fn type_patterns_use_explicit_parameters() {
    let solutions = select(
        r#"SELECT ?part WHERE {
            ?split a func:StringSplitter ;
                func:splitString "a-b" ;
                func:separator "-" ;
                func:splitted ?part .
        }"#,
    );
    assert_eq!(column(&solutions, "part"), vec![literal("a"), literal("b")]);
}

#[test]
fn type_patterns_apply_constant_constraints() {
    let solutions = select(
        r#"SELECT ?part WHERE {
            ?split a func:StringSplitter ;
                func:splitString "a b c" ;
                func:index 1 ;
                func:splitted ?part .
        }"#,
    );
    assert_eq!(column(&solutions, "part"), vec![literal("b")]);
}

#[test]
fn type_pattern_failures_skip_the_solution() {
    let solutions = select(
        r#"SELECT ?in ?out WHERE {
            VALUES ?in { "good" "bad" }
            ?check a func:Checker ; func:input ?in ; func:output ?out .
        }"#,
    );
    assert_eq!(column(&solutions, "in"), vec![literal("good")]);
    assert_eq!(column(&solutions, "out"), vec![literal("ok-good")]);
}

static COUNTED_CALLS: AtomicUsize = AtomicUsize::new(0);

fn counted(args: &FunctionArgs) -> Result<FunctionOutput, FunctionError> {
    COUNTED_CALLS.fetch_add(1, Ordering::SeqCst);
    Ok(FunctionOutput::scalar(format!("seen-{}", args.str("input")?)))
}

#[test]
fn type_patterns_stream_their_base_solutions() {
    let data = (0..100)
        .map(|i| format!("ex:doc{i} ex:text \"text {i}\" ."))
        .collect::<Vec<_>>()
        .join("\n");
    let storage = storage(&format!(
        "PREFIX ex: <http://example.com/> INSERT DATA {{ {data} }}"
    ));
    let mut registry = FunctionRegistry::new();
    registry
        .register(
            FunctionDefinition::type_pattern("counted", counted)
                .with_signature(Signature::new(OutputShape::Scalar).with_parameter("input")),
        )
        .unwrap();
    let options = QueryOptions::default().with_custom_evaluator(Arc::new(registry));
    let query = Query::parse(
        &format!(
            r#"PREFIX func: <{FUNC}>
            PREFIX ex: <http://example.com/>
            SELECT ?out WHERE {{
                ?doc ex:text ?text .
                ?c a func:Counted ; func:input ?text ; func:output ?out .
            }}"#
        ),
        None,
    )
    .unwrap();
    let QueryResults::Solutions(mut solutions) =
        evaluate_query(Arc::clone(&storage), &query, &options).unwrap()
    else {
        panic!("Expected solutions");
    };
    assert!(solutions.next().is_some_and(|solution| solution.is_ok()));
    assert_eq!(COUNTED_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(solutions.count(), 99);
    assert_eq!(COUNTED_CALLS.load(Ordering::SeqCst), 100);
}

#[test]
fn type_patterns_join_with_stored_triples() {
    let storage = storage(
        r#"PREFIX ex: <http://example.com/>
        INSERT DATA { ex:doc ex:text "one two" }"#,
    );
    let solutions = try_select(
        &storage,
        r#"PREFIX ex: <http://example.com/>
        SELECT ?doc ?part WHERE {
            ?doc ex:text ?text .
            ?split a func:StringSplitter ; func:splitString ?text ; func:splitted ?part .
        }"#,
    )
    .unwrap();
    assert_eq!(
        column(&solutions, "part"),
        vec![literal("one"), literal("two")]
    );
}

#[test]
fn predicate_patterns_canonicalize_constant_subjects() {
    let solutions = select(&format!(
        r#"PREFIX dc: <{DC}>
        SELECT ?id WHERE {{ <{CHEBI}1> dc:identifier ?id . }}"#
    ));
    assert_eq!(column(&solutions, "id"), vec![iri(format!("{OBO}1"))]);
}

#[test]
fn predicate_patterns_compute_objects() {
    let storage = storage(&format!(
        r#"INSERT DATA {{
            <{CHEBI}15377> a <http://example.com/Compound> .
            <http://example.com/water> a <http://example.com/Compound> .
        }}"#
    ));
    let solutions = try_select(
        &storage,
        &format!(
            r#"SELECT ?s ?id WHERE {{
                ?s a <http://example.com/Compound> ; <{DC}identifier> ?id .
            }}"#
        ),
    )
    .unwrap();
    assert_eq!(column(&solutions, "id"), vec![iri(format!("{OBO}15377"))]);
}

#[test]
fn predicate_patterns_check_constant_objects() {
    let solutions = select(&format!(
        r#"SELECT ?s WHERE {{
            VALUES ?s {{ <{CHEBI}1> <{CHEBI}2> }}
            ?s <{DC}identifier> <{OBO}1> .
        }}"#
    ));
    assert_eq!(
        column(&solutions, "s"),
        vec![iri(format!("{CHEBI}1"))]
    );
}

#[test]
fn equality_filters_are_pushed_into_predicate_patterns() {
    let solutions = select(&format!(
        r#"SELECT ?s ?id WHERE {{
            ?s <{DC}identifier> ?id
            FILTER(?s = <{CHEBI}1> || ?s = <{CHEBI}2>)
        }}"#
    ));
    assert_eq!(
        column(&solutions, "id"),
        vec![iri(format!("{OBO}1")), iri(format!("{OBO}2"))]
    );
    assert_eq!(
        column(&solutions, "s"),
        vec![iri(format!("{CHEBI}1")), iri(format!("{CHEBI}2"))]
    );
}

#[test]
fn filters_without_function_patterns_are_evaluated_normally() {
    let storage = storage(
        r#"PREFIX ex: <http://example.com/>
        INSERT DATA { ex:a ex:p 1 . ex:b ex:p 2 }"#,
    );
    let solutions = try_select(
        &storage,
        r#"PREFIX ex: <http://example.com/>
        SELECT ?s WHERE { ?s ex:p ?o FILTER(?s = ex:a) }"#,
    )
    .unwrap();
    assert_eq!(
        column(&solutions, "s"),
        vec![iri("http://example.com/a")]
    );
}

#[test]
fn extension_errors_fail_the_query() {
    let result = try_select(
        &storage(""),
        r#"SELECT ?x WHERE { BIND(func:fail() AS ?x) }"#,
    );
    assert!(matches!(
        result,
        Err(QueryEvaluationError::Function { message, .. }) if message == "boom"
    ));
}

#[test]
fn extension_arity_errors_fail_the_query() {
    let result = try_select(
        &storage(""),
        r#"SELECT ?x WHERE { BIND(func:split("a", "b", "c") AS ?x) }"#,
    );
    assert!(matches!(result, Err(QueryEvaluationError::Function { .. })));
}

#[test]
fn argument_errors_keep_their_cause() {
    let result = try_select(
        &storage(""),
        r#"SELECT ?x WHERE { BIND(func:split(?missing) AS ?x) }"#,
    );
    let Err(QueryEvaluationError::Function { function, message }) = result else {
        panic!("Expected a function error");
    };
    assert_eq!(function.as_str(), format!("{FUNC}split"));
    assert_eq!(
        message,
        "The argument 1 could not be evaluated: The expression has no value"
    );
}

#[test]
fn unknown_functions_fall_back_to_the_default_evaluation() {
    let solutions =
        select(r#"SELECT ?x WHERE { BIND(<http://example.com/unknown>("a") AS ?x) }"#);
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get("x"), None);
}

#[test]
fn legacy_functions_append_solutions() {
    let solutions = select(
        r#"SELECT ?concat ?concatLength WHERE { BIND(func:custom_concat("ab", "cde") AS ?concat) }"#,
    );
    assert_eq!(
        column(&solutions, "concat"),
        vec![literal("abcde"), literal("cdeab")]
    );
    assert_eq!(
        column(&solutions, "concatLength"),
        vec![integer(5), integer(5)]
    );
}

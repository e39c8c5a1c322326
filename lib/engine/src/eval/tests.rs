use super::*;
use crate::memory::MemoryQuadStorage;
use crate::results::{QueryResults, QuerySolutionIter};
use crate::sparql::{
    evaluate_query, evaluate_update, Query, QueryDataset, QueryOptions, Update,
};
use rdf_hooks_model::Literal;
use sparesults::QuerySolution;

const DATA: &str = r#"
PREFIX ex: <http://example.com/>
INSERT DATA {
    ex:alice ex:knows ex:bob ; ex:age 30 ; ex:name "Alice" .
    ex:bob ex:knows ex:carol ; ex:age 25 ; ex:name "Bob" .
    ex:carol ex:age 41 .
    GRAPH ex:g1 { ex:alice ex:likes ex:tea }
    GRAPH ex:g2 { ex:bob ex:likes ex:coffee }
}
"#;

fn storage() -> Arc<dyn QuadStorage> {
    let storage: Arc<dyn QuadStorage> = Arc::new(MemoryQuadStorage::new());
    update(&storage, DATA);
    storage
}

fn update(storage: &Arc<dyn QuadStorage>, update: &str) {
    let update = Update::parse(update, None).unwrap();
    evaluate_update(Arc::clone(storage), &update, &QueryOptions::default().into()).unwrap();
}

fn select_with(
    storage: &Arc<dyn QuadStorage>,
    query: &str,
    options: &QueryOptions,
) -> Vec<QuerySolution> {
    let query = Query::parse(query, None).unwrap();
    let QueryResults::Solutions(solutions) =
        evaluate_query(Arc::clone(storage), &query, options).unwrap()
    else {
        panic!("Expected solutions");
    };
    solutions.collect::<Result<Vec<_>, _>>().unwrap()
}

fn select(storage: &Arc<dyn QuadStorage>, query: &str) -> Vec<QuerySolution> {
    select_with(storage, query, &QueryOptions::default())
}

fn ex(name: &str) -> Term {
    NamedNode::new_unchecked(format!("http://example.com/{name}")).into()
}

fn column(solutions: &[QuerySolution], variable: &str) -> Vec<Option<Term>> {
    solutions
        .iter()
        .map(|solution| solution.get(variable).cloned())
        .collect()
}

#[test]
fn joins_and_filters() {
    let solutions = select(
        &storage(),
        "PREFIX ex: <http://example.com/>
         SELECT ?x ?y WHERE { ?x ex:knows ?y . ?y ex:age ?age FILTER(?age > 26) }",
    );
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get("x"), Some(&ex("bob")));
    assert_eq!(solutions[0].get("y"), Some(&ex("carol")));
}

#[test]
fn optional_keeps_unmatched_solutions() {
    let solutions = select(
        &storage(),
        "PREFIX ex: <http://example.com/>
         SELECT ?x ?name WHERE { ?x ex:age ?age OPTIONAL { ?x ex:name ?name } } ORDER BY ?x",
    );
    assert_eq!(
        column(&solutions, "name"),
        vec![
            Some(Literal::new_simple_literal("Alice").into()),
            Some(Literal::new_simple_literal("Bob").into()),
            None
        ]
    );
}

#[test]
fn graph_variable_iterates_named_graphs() {
    let solutions = select(
        &storage(),
        "PREFIX ex: <http://example.com/>
         SELECT ?g ?o WHERE { GRAPH ?g { ?s ex:likes ?o } } ORDER BY ?g",
    );
    assert_eq!(column(&solutions, "g"), vec![Some(ex("g1")), Some(ex("g2"))]);
    assert_eq!(column(&solutions, "o"), vec![Some(ex("tea")), Some(ex("coffee"))]);
}

#[test]
fn union_default_graph() {
    let storage = storage();
    let mut query = Query::parse(
        "PREFIX ex: <http://example.com/> SELECT ?o WHERE { ?s ex:likes ?o }",
        None,
    )
    .unwrap();
    query.dataset_mut().set_default_graph_as_union();
    let QueryResults::Solutions(solutions) =
        evaluate_query(storage, &query, &QueryOptions::default()).unwrap()
    else {
        panic!("Expected solutions");
    };
    assert_eq!(solutions.count(), 2);
}

#[test]
fn transitive_paths() {
    let solutions = select(
        &storage(),
        "PREFIX ex: <http://example.com/>
         SELECT ?y WHERE { ex:alice ex:knows+ ?y } ORDER BY ?y",
    );
    assert_eq!(column(&solutions, "y"), vec![Some(ex("bob")), Some(ex("carol"))]);

    let solutions = select(
        &storage(),
        "PREFIX ex: <http://example.com/>
         SELECT ?x WHERE { ?x ^ex:knows* ex:carol } ORDER BY ?x",
    );
    assert_eq!(column(&solutions, "x"), vec![Some(ex("carol"))]);
}

#[test]
fn aggregates() {
    let solutions = select(
        &storage(),
        "PREFIX ex: <http://example.com/>
         SELECT (COUNT(*) AS ?count) (SUM(?age) AS ?sum) (MAX(?age) AS ?max)
         WHERE { ?x ex:age ?age }",
    );
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get("count"), Some(&Literal::from(3).into()));
    assert_eq!(solutions[0].get("sum"), Some(&Literal::from(96).into()));
    assert_eq!(solutions[0].get("max"), Some(&Literal::from(41).into()));
}

#[test]
fn values_minus_and_sub_select() {
    let solutions = select(
        &storage(),
        "PREFIX ex: <http://example.com/>
         SELECT ?x WHERE {
            VALUES ?x { ex:alice ex:bob ex:carol }
            MINUS { ?x ex:knows ex:carol }
            { SELECT ?x WHERE { ?x ex:age ?age } }
         } ORDER BY ?x",
    );
    assert_eq!(column(&solutions, "x"), vec![Some(ex("alice")), Some(ex("carol"))]);
}

#[test]
fn expressions_in_bind() {
    let solutions = select(
        &storage(),
        r#"SELECT ?upper ?len ?sum WHERE {
            BIND(UCASE("abc") AS ?upper)
            BIND(STRLEN("héllo") AS ?len)
            BIND(1 + 2 * 3 AS ?sum)
        }"#,
    );
    assert_eq!(
        solutions[0].get("upper"),
        Some(&Literal::new_simple_literal("ABC").into())
    );
    assert_eq!(solutions[0].get("len"), Some(&Literal::from(5).into()));
    assert_eq!(solutions[0].get("sum"), Some(&Literal::from(7).into()));
}

#[test]
fn ask_and_construct() {
    let storage = storage();
    let query = Query::parse(
        "PREFIX ex: <http://example.com/> ASK { ex:alice ex:knows ex:bob }",
        None,
    )
    .unwrap();
    assert!(matches!(
        evaluate_query(Arc::clone(&storage), &query, &QueryOptions::default()),
        Ok(QueryResults::Boolean(true))
    ));

    let query = Query::parse(
        "PREFIX ex: <http://example.com/>
         CONSTRUCT { ?y ex:knownBy ?x } WHERE { ?x ex:knows ?y }",
        None,
    )
    .unwrap();
    let QueryResults::Graph(triples) =
        evaluate_query(storage, &query, &QueryOptions::default()).unwrap()
    else {
        panic!("Expected a graph");
    };
    assert_eq!(triples.collect_as_graph().unwrap().len(), 2);
}

/// Answers every basic graph pattern with `?magic = 42`.
struct MagicEvaluator;

impl CustomEvaluator for MagicEvaluator {
    fn evaluate(
        &self,
        _evaluator: &SimpleEvaluator,
        node: &Arc<AlgebraNode>,
        context: &EvalContext,
    ) -> Result<Option<SolutionIter>, QueryEvaluationError> {
        let AlgebraNode::Bgp { patterns } = node.as_ref() else {
            return Ok(None);
        };
        if patterns.is_empty() {
            return Ok(None);
        }
        let solution = context
            .solution
            .with(Variable::new_unchecked("magic"), Literal::from(42).into());
        Ok(Some(Box::new(solution.into_iter().map(Ok))))
    }
}

#[test]
fn custom_evaluators_take_over_nodes() {
    let options = QueryOptions::default().with_custom_evaluator(Arc::new(MagicEvaluator));
    let solutions = select_with(
        &storage(),
        "SELECT ?magic WHERE { ?s ?p ?o }",
        &options,
    );
    assert_eq!(
        column(&solutions, "magic"),
        vec![Some(Literal::from(42).into())]
    );
}

/// Fills a temporary graph whenever `BIND(<http://example.com/graph>() AS ?g)` is evaluated.
///
/// The graph holds `"{label}1"` and `"{label}2"` as objects of two distinct subjects.
struct GraphMaker {
    label: &'static str,
}

impl CustomEvaluator for GraphMaker {
    fn evaluate(
        &self,
        evaluator: &SimpleEvaluator,
        node: &Arc<AlgebraNode>,
        context: &EvalContext,
    ) -> Result<Option<SolutionIter>, QueryEvaluationError> {
        let AlgebraNode::Extend {
            inner,
            variable,
            expression,
        } = node.as_ref()
        else {
            return Ok(None);
        };
        if crate::plan::custom_function_call(expression).is_none() {
            return Ok(None);
        }
        let graph = NamedNode::new_unchecked("http://example.com/temporary");
        evaluator.insert_temporary_graph(&graph, graph_maker_triples(self.label))?;
        let variable = variable.clone();
        Ok(Some(Box::new(evaluator.evaluate(inner, context).map(
            move |solution| {
                solution.map(|solution| {
                    solution
                        .with(variable.clone(), graph.clone().into())
                        .unwrap_or(solution)
                })
            },
        ))))
    }
}

fn graph_maker_triples(label: &str) -> Vec<Triple> {
    (1..=2)
        .map(|i| {
            Triple::new(
                NamedNode::new_unchecked(format!("http://example.com/s{i}")),
                NamedNode::new_unchecked("http://example.com/p"),
                Literal::new_simple_literal(format!("{label}{i}")),
            )
        })
        .collect()
}

/// The second pattern is looked up lazily, once per row of the first one.
const GRAPH_MAKER_QUERY: &str =
    "SELECT ?o WHERE { BIND(<http://example.com/graph>() AS ?g) GRAPH ?g { ?s ?p ?o . ?s ?p ?o } }";

fn graph_maker_options(label: &'static str) -> QueryOptions {
    QueryOptions::default().with_custom_evaluator(Arc::new(GraphMaker { label }))
}

fn lazy_select(
    storage: &Arc<dyn QuadStorage>,
    query: &str,
    options: &QueryOptions,
) -> QuerySolutionIter {
    let query = Query::parse(query, None).unwrap();
    let QueryResults::Solutions(solutions) =
        evaluate_query(Arc::clone(storage), &query, options).unwrap()
    else {
        panic!("Expected solutions");
    };
    solutions
}

fn sorted_objects<'a>(solutions: impl IntoIterator<Item = &'a QuerySolution>) -> Vec<String> {
    let mut objects = solutions
        .into_iter()
        .filter_map(|solution| solution.get("o").map(ToString::to_string))
        .collect::<Vec<_>>();
    objects.sort();
    objects
}

#[test]
fn temporary_graphs_are_purged_after_the_results() {
    let storage: Arc<dyn QuadStorage> = Arc::new(MemoryQuadStorage::new());
    let solutions = select_with(&storage, GRAPH_MAKER_QUERY, &graph_maker_options("o"));
    assert_eq!(sorted_objects(&solutions), vec!["\"o1\"", "\"o2\""]);
    assert_eq!(storage.len().unwrap(), 0);
    assert!(storage.named_graphs().unwrap().is_empty());
}

#[test]
fn temporary_graphs_never_reach_the_storage() {
    let storage: Arc<dyn QuadStorage> = Arc::new(MemoryQuadStorage::new());
    let mut solutions = lazy_select(&storage, GRAPH_MAKER_QUERY, &graph_maker_options("o"));
    assert!(solutions.next().is_some());
    assert_eq!(storage.len().unwrap(), 0);
    assert!(storage.named_graphs().unwrap().is_empty());
    drop(solutions);
    assert_eq!(storage.len().unwrap(), 0);
}

#[test]
fn dropping_the_guard_purges_temporary_graphs() {
    let storage: Arc<dyn QuadStorage> = Arc::new(MemoryQuadStorage::new());
    let evaluator = SimpleEvaluator::new(
        Arc::clone(&storage),
        QueryDataset::new(),
        None,
        Vec::new(),
    );
    let guard = TemporaryGraphGuard::new(evaluator.clone());
    let graph = NamedNode::new_unchecked("http://example.com/temporary");
    evaluator
        .insert_temporary_graph(&graph, graph_maker_triples("o"))
        .unwrap();
    let in_graph = ActiveGraph::Named(graph.clone().into());
    assert_eq!(
        evaluator
            .triples_for_pattern(None, None, None, &in_graph)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(storage.len().unwrap(), 0);

    drop(guard);
    assert!(evaluator.temporary_graphs().graphs().is_empty());
    assert!(evaluator.temporary_graphs().is_empty().unwrap());
    assert!(evaluator
        .triples_for_pattern(None, None, None, &in_graph)
        .unwrap()
        .is_empty());
}

#[test]
fn temporary_graphs_are_private_to_each_query() {
    let storage: Arc<dyn QuadStorage> = Arc::new(MemoryQuadStorage::new());
    let mut first = lazy_select(&storage, GRAPH_MAKER_QUERY, &graph_maker_options("first"));
    let first_row = first.next().unwrap().unwrap();

    let second = select_with(&storage, GRAPH_MAKER_QUERY, &graph_maker_options("second"));
    assert_eq!(
        sorted_objects(&second),
        vec!["\"second1\"", "\"second2\""]
    );

    let rest = first.collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(
        sorted_objects([&first_row].into_iter().chain(&rest)),
        vec!["\"first1\"", "\"first2\""]
    );
    assert_eq!(storage.len().unwrap(), 0);
}

#[test]
fn evaluate_bgp_streams_solutions() {
    let evaluator = SimpleEvaluator::new(storage(), QueryDataset::new(), None, Vec::new());
    let context = EvalContext::default();
    let solutions = evaluator
        .evaluate_bgp(Vec::new(), &context)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(solutions, vec![Solution::empty()]);

    let pattern = TriplePattern {
        subject: TermPattern::Variable(Variable::new_unchecked("x")),
        predicate: NamedNodePattern::NamedNode(NamedNode::new_unchecked(
            "http://example.com/age",
        )),
        object: TermPattern::Variable(Variable::new_unchecked("age")),
    };
    let mut solutions = evaluator.evaluate_bgp(vec![pattern], &context);
    assert!(solutions.next().is_some_and(|solution| solution.is_ok()));
    assert_eq!(solutions.count(), 2);
}

#[test]
fn delete_insert_where() {
    let storage = storage();
    update(
        &storage,
        "PREFIX ex: <http://example.com/>
         DELETE { ?x ex:age ?age } INSERT { ?x ex:age ?next }
         WHERE { ?x ex:age ?age BIND(?age + 1 AS ?next) }",
    );
    let solutions = select(
        &storage,
        "PREFIX ex: <http://example.com/> SELECT ?age WHERE { ex:carol ex:age ?age }",
    );
    assert_eq!(column(&solutions, "age"), vec![Some(Literal::from(42).into())]);
}

#[test]
fn graph_management() {
    let storage = storage();
    let apply = |update: &str| {
        let update = Update::parse(update, None).unwrap();
        evaluate_update(Arc::clone(&storage), &update, &QueryOptions::default().into())
    };

    assert!(matches!(
        apply("CREATE GRAPH <http://example.com/g1>"),
        Err(QueryEvaluationError::GraphAlreadyExists(_))
    ));
    assert!(apply("CREATE SILENT GRAPH <http://example.com/g1>").is_ok());
    assert!(matches!(
        apply("CLEAR GRAPH <http://example.com/missing>"),
        Err(QueryEvaluationError::GraphDoesNotExist(_))
    ));
    assert!(apply("DROP GRAPH <http://example.com/g1>").is_ok());
    assert_eq!(storage.named_graphs().unwrap().len(), 1);
    assert!(matches!(
        apply("LOAD <http://example.com/data.ttl>"),
        Err(QueryEvaluationError::NotImplemented(_))
    ));
    assert!(apply("CLEAR ALL").is_ok());
    assert_eq!(storage.len().unwrap(), 0);
}

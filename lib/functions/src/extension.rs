use crate::definition::{FunctionArgs, FunctionOutput, OutputRow, StructValue};
use crate::error::FunctionError;
use crate::registry::RegisteredFunction;
use rdf_hooks_engine::sparql::error::QueryEvaluationError;
use rdf_hooks_engine::{ActiveGraph, AlgebraNode, EvalContext, SimpleEvaluator, Solution, SolutionIter};
use rdf_hooks_model::{snake_to_pascal, Term, Value, Variable};
use spargebra::algebra::Expression;
use std::iter::once;
use std::sync::Arc;

/// The parts of a `BIND(<iri>(args...) AS ?variable)` node.
pub(crate) struct ExtendCall<'a> {
    pub inner: &'a Arc<AlgebraNode>,
    pub variable: &'a Variable,
    pub arguments: &'a [Expression],
}

/// Evaluates an extension function for every solution of the inner node.
///
/// Errors of the function are fatal for the query.
pub(crate) fn evaluate(
    function: &Arc<RegisteredFunction>,
    evaluator: &SimpleEvaluator,
    call: &ExtendCall<'_>,
    context: &EvalContext,
) -> SolutionIter {
    let function = Arc::clone(function);
    let evaluator_clone = evaluator.clone();
    let variable = call.variable.clone();
    let arguments: Arc<[Expression]> = call.arguments.into();
    let graph = context.graph.clone();
    Box::new(
        evaluator
            .evaluate(call.inner, context)
            .flat_map(move |solution| -> SolutionIter {
                let solutions = solution.and_then(|solution| {
                    let args =
                        evaluate_arguments(&function, &evaluator_clone, &arguments, &solution, &graph)?;
                    let output = call_function(&function, &args)?;
                    bind_output(&variable, &solution, output)
                        .map_err(|error| function_error(&function, &error))
                });
                match solutions {
                    Ok(solutions) => Box::new(solutions.into_iter().map(Ok)),
                    Err(error) => Box::new(once(Err(error))),
                }
            }),
    )
}

/// Evaluates the argument expressions and binds them to the signature of `function`.
pub(crate) fn evaluate_arguments(
    function: &RegisteredFunction,
    evaluator: &SimpleEvaluator,
    arguments: &[Expression],
    solution: &Solution,
    graph: &ActiveGraph,
) -> Result<FunctionArgs, QueryEvaluationError> {
    let values = arguments
        .iter()
        .enumerate()
        .map(|(index, argument)| {
            evaluator
                .evaluate_expression(argument, solution, graph)
                .map(Value::from_term)
                .map_err(|error| {
                    QueryEvaluationError::function(
                        function.iri(),
                        format!("The argument {} could not be evaluated: {error}", index + 1),
                    )
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    match function.definition().signature() {
        Some(signature) => signature.bind(values),
        None => Ok(FunctionArgs::positional(values)),
    }
    .map_err(|error| function_error(function, &error))
}

/// Calls `function` and checks the output against its declared shape.
pub(crate) fn call_function(
    function: &RegisteredFunction,
    args: &FunctionArgs,
) -> Result<FunctionOutput, QueryEvaluationError> {
    function
        .definition()
        .call(args)
        .and_then(|output| output.check(function.output()))
        .map_err(|error| function_error(function, &error))
}

pub(crate) fn function_error(
    function: &RegisteredFunction,
    error: &FunctionError,
) -> QueryEvaluationError {
    QueryEvaluationError::function(function.iri(), error.to_string())
}

/// Turns the output into one solution per row.
///
/// Scalar rows bind `variable`. Struct rows bind their primary field, `value` or else the first
/// one, to `variable` and every other field `f` to `?{variable}{F}`.
fn bind_output(
    variable: &Variable,
    solution: &Solution,
    output: FunctionOutput,
) -> Result<Vec<Solution>, FunctionError> {
    let mut solutions = Vec::new();
    for row in output.into_rows()? {
        let bindings = match row {
            OutputRow::Value(value) => vec![(variable.clone(), value.into_term())],
            OutputRow::Struct(fields) => struct_bindings(variable, &fields)?,
        };
        if let Some(solution) = solution.extend(bindings) {
            solutions.push(solution);
        }
    }
    Ok(solutions)
}

fn struct_bindings(
    variable: &Variable,
    fields: &StructValue,
) -> Result<Vec<(Variable, Term)>, FunctionError> {
    let primary = if fields.get("value").is_some() {
        "value"
    } else {
        fields
            .fields()
            .first()
            .map(|(name, _)| name.as_str())
            .ok_or(FunctionError::EmptyStruct)?
    };

    fields
        .fields()
        .iter()
        .map(|(name, value)| {
            let target = if name == primary {
                variable.clone()
            } else {
                Variable::new(format!("{}{}", variable.as_str(), snake_to_pascal(name)))
                    .map_err(|_| FunctionError::InvalidField(name.clone()))?
            };
            Ok((target, value.clone().into_term()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_hooks_model::Literal;

    fn variable(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    #[test]
    fn multi_output_fans_out() {
        let solutions = bind_output(
            &variable("part"),
            &Solution::empty(),
            FunctionOutput::multi(["a", "b"]),
        )
        .unwrap();
        let parts = solutions
            .iter()
            .map(|solution| solution.get(&variable("part")).cloned())
            .collect::<Vec<_>>();
        assert_eq!(
            parts,
            vec![
                Some(Term::from(Literal::new_simple_literal("a"))),
                Some(Term::from(Literal::new_simple_literal("b")))
            ]
        );
    }

    #[test]
    fn struct_fields_bind_suffixed_variables() {
        let output = FunctionOutput::MultiStruct(vec![StructValue::new()
            .with("value", "hello")
            .with("index", 0)]);
        let solutions = bind_output(&variable("part"), &Solution::empty(), output).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(
            solutions[0].get(&variable("part")),
            Some(&Term::from(Literal::new_simple_literal("hello")))
        );
        assert_eq!(
            solutions[0].get(&variable("partIndex")),
            Some(&Term::from(Literal::from(0_i64)))
        );
    }

    #[test]
    fn struct_without_value_uses_the_first_field() {
        let output = StructValue::new().with("name", "x").with("score", 1.5);
        let solutions = bind_output(&variable("r"), &Solution::empty(), output.into()).unwrap();
        assert!(solutions[0].get(&variable("r")).is_some());
        assert!(solutions[0].get(&variable("rScore")).is_some());
    }

    #[test]
    fn empty_structs_are_rejected() {
        assert_eq!(
            bind_output(
                &variable("r"),
                &Solution::empty(),
                StructValue::new().into()
            ),
            Err(FunctionError::EmptyStruct)
        );
    }

    #[test]
    fn incompatible_rows_are_dropped() {
        let solution = Solution::empty()
            .with(variable("part"), Literal::new_simple_literal("a").into())
            .unwrap();
        let solutions =
            bind_output(&variable("part"), &solution, FunctionOutput::multi(["a", "b"])).unwrap();
        assert_eq!(solutions, vec![solution]);
    }
}

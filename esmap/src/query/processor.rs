//! Criteria chains to Elasticsearch query DSL

use serde_json::{json, Map, Value};

use super::criteria::{Criteria, CriteriaChain, CriteriaEntry};
use super::parameter::Parameter;

/// Renders criteria chains as `bool` queries.
///
/// AND-joined runs become `must` clauses, negated nodes `must_not`. Several
/// OR-separated runs are wrapped in `should` with `minimum_should_match: 1`.
pub struct CriteriaQueryProcessor;

impl CriteriaQueryProcessor {
    pub fn to_query_dsl(chain: &CriteriaChain) -> Value {
        let runs: Vec<Value> = chain
            .and_runs()
            .into_iter()
            .filter_map(render_run)
            .collect();

        match runs.len() {
            0 => json!({ "match_all": {} }),
            1 => runs.into_iter().next().unwrap_or_else(|| json!({ "match_all": {} })),
            _ => json!({
                "bool": {
                    "should": runs,
                    "minimum_should_match": 1
                }
            }),
        }
    }
}

/// `None` for a run without any renderable node.
fn render_run(run: &[Criteria]) -> Option<Value> {
    let mut must = Vec::new();
    let mut must_not = Vec::new();

    for node in run {
        let Some(query) = render_node(node) else {
            continue;
        };
        if node.is_negating() {
            must_not.push(query);
        } else {
            must.push(query);
        }
    }

    if must.is_empty() && must_not.is_empty() {
        return None;
    }

    let mut bool_query = Map::new();
    if !must.is_empty() {
        bool_query.insert("must".into(), Value::Array(must));
    }
    if !must_not.is_empty() {
        bool_query.insert("must_not".into(), Value::Array(must_not));
    }
    Some(json!({ "bool": bool_query }))
}

fn render_node(node: &Criteria) -> Option<Value> {
    if let Some(group) = node.sub_chain() {
        return Some(CriteriaQueryProcessor::to_query_dsl(group));
    }

    let field = node.field()?;
    let mut queries: Vec<Value> = node
        .entries()
        .iter()
        .map(|entry| render_entry(field, entry))
        .collect();

    if let Some(boost) = node.boost_value() {
        for query in &mut queries {
            apply_boost(query, boost);
        }
    }

    match queries.len() {
        0 => None,
        1 => queries.pop(),
        _ => Some(json!({ "bool": { "must": queries } })),
    }
}

fn render_entry(field: &str, entry: &CriteriaEntry) -> Value {
    match entry {
        CriteriaEntry::Exists => json!({ "exists": { "field": field } }),

        CriteriaEntry::Equals(Parameter::Null) => json!({
            "bool": { "must_not": [{ "exists": { "field": field } }] }
        }),
        CriteriaEntry::Equals(value @ Parameter::Text(_)) => json!({
            "query_string": {
                "query": escape_query(&value.to_query_string()),
                "fields": [field],
                "default_operator": "and"
            }
        }),
        CriteriaEntry::Equals(value) => json!({
            "term": { field: { "value": value.to_json() } }
        }),

        CriteriaEntry::StartsWith(value) => {
            wildcard(field, format!("{}*", escape_query(&value.to_query_string())))
        }
        CriteriaEntry::EndsWith(value) => {
            wildcard(field, format!("*{}", escape_query(&value.to_query_string())))
        }
        CriteriaEntry::Contains(value) => {
            wildcard(field, format!("*{}*", escape_query(&value.to_query_string())))
        }
        CriteriaEntry::Expression(expression) => json!({
            "query_string": {
                "query": expression,
                "fields": [field]
            }
        }),

        CriteriaEntry::Less(value) => range(field, [("lt", value)]),
        CriteriaEntry::LessEqual(value) => range(field, [("lte", value)]),
        CriteriaEntry::Greater(value) => range(field, [("gt", value)]),
        CriteriaEntry::GreaterEqual(value) => range(field, [("gte", value)]),
        CriteriaEntry::Between(lower, upper) => range(field, [("gte", lower), ("lte", upper)]),

        CriteriaEntry::In(values) => terms(field, values),
        CriteriaEntry::NotIn(values) => json!({
            "bool": { "must_not": [terms(field, values)] }
        }),
    }
}

fn wildcard(field: &str, query: String) -> Value {
    json!({
        "query_string": {
            "query": query,
            "fields": [field],
            "analyze_wildcard": true
        }
    })
}

fn range<'a>(field: &str, bounds: impl IntoIterator<Item = (&'static str, &'a Parameter)>) -> Value {
    let bounds: Map<String, Value> = bounds
        .into_iter()
        .map(|(op, value)| (op.to_string(), value.to_json()))
        .collect();
    json!({ "range": { field: bounds } })
}

fn terms(field: &str, values: &[Parameter]) -> Value {
    let values: Vec<Value> = values.iter().map(Parameter::to_json).collect();
    json!({ "terms": { field: values } })
}

/// `term` and `range` carry the boost per field, everything else at the top.
fn apply_boost(query: &mut Value, boost: f32) {
    let Some(object) = query.as_object_mut() else {
        return;
    };
    let Some((kind, inner)) = object.iter_mut().next() else {
        return;
    };
    let target = match kind.as_str() {
        "term" | "range" => inner
            .as_object_mut()
            .and_then(|fields| fields.values_mut().next()),
        _ => Some(inner),
    };
    if let Some(Value::Object(target)) = target {
        target.insert("boost".into(), json!(boost));
    }
}

/// Backslash-escape query_string syntax characters.
fn escape_query(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\+-!():^[]\"{}~*?|&/".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

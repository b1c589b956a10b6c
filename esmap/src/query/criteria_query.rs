use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::criteria::CriteriaChain;
use super::part::SubjectKind;
use super::processor::CriteriaQueryProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Sort on one property. Derived queries hold field paths here once the
/// property has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Desc)
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pageable {
    pub page: usize,
    pub size: usize,
}

impl Pageable {
    pub fn of(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    pub fn offset(&self) -> usize {
        self.page * self.size
    }
}

/// What a repository method declares it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    Single,
    #[default]
    Collection,
    Page,
    Stream,
}

/// How a derived query is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionShape {
    Count,
    Delete,
    Page,
    Stream,
    Collection,
    Single,
}

impl ExecutionShape {
    /// The subject decides for count, exists, delete and stream methods; the
    /// declared return kind decides for everything else.
    pub fn derive(kind: SubjectKind, return_kind: ReturnKind) -> Self {
        match kind {
            SubjectKind::Count | SubjectKind::Exists => ExecutionShape::Count,
            SubjectKind::Delete => ExecutionShape::Delete,
            SubjectKind::Stream => ExecutionShape::Stream,
            SubjectKind::Find => match return_kind {
                ReturnKind::Single => ExecutionShape::Single,
                ReturnKind::Collection => ExecutionShape::Collection,
                ReturnKind::Page => ExecutionShape::Page,
                ReturnKind::Stream => ExecutionShape::Stream,
            },
        }
    }
}

/// A repository method as the query engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMethod {
    pub entity: String,
    pub name: String,
    pub return_kind: ReturnKind,
    pub pageable: Option<Pageable>,
    pub highlight_fields: Vec<String>,
}

impl QueryMethod {
    pub fn new(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            name: name.into(),
            return_kind: ReturnKind::default(),
            pageable: None,
            highlight_fields: Vec::new(),
        }
    }

    pub fn returns(mut self, return_kind: ReturnKind) -> Self {
        self.return_kind = return_kind;
        self
    }

    pub fn pageable(mut self, pageable: Pageable) -> Self {
        self.pageable = Some(pageable);
        self
    }

    pub fn highlight<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// A criteria tree plus everything needed to execute it.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaQuery {
    criteria: CriteriaChain,
    sort: Vec<Order>,
    max_results: Option<usize>,
    pageable: Option<Pageable>,
    highlight_fields: Vec<String>,
    distinct: bool,
    shape: ExecutionShape,
}

impl CriteriaQuery {
    pub fn new(criteria: CriteriaChain) -> Self {
        Self {
            criteria,
            sort: Vec::new(),
            max_results: None,
            pageable: None,
            highlight_fields: Vec::new(),
            distinct: false,
            shape: ExecutionShape::Collection,
        }
    }

    pub fn with_sort(mut self, sort: Vec<Order>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_pageable(mut self, pageable: Option<Pageable>) -> Self {
        self.pageable = pageable;
        self
    }

    pub fn with_highlight_fields(mut self, fields: Vec<String>) -> Self {
        self.highlight_fields = fields;
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_shape(mut self, shape: ExecutionShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn criteria(&self) -> &CriteriaChain {
        &self.criteria
    }

    pub fn sort(&self) -> &[Order] {
        &self.sort
    }

    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    pub fn pageable(&self) -> Option<Pageable> {
        self.pageable
    }

    pub fn highlight_fields(&self) -> &[String] {
        &self.highlight_fields
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn shape(&self) -> ExecutionShape {
        self.shape
    }

    /// Search request body: `query`, then `sort`, `from`/`size` and
    /// `highlight` when set. `max_results` caps the page size.
    pub fn to_request_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".into(), CriteriaQueryProcessor::to_query_dsl(&self.criteria));

        if !self.sort.is_empty() {
            let sort: Vec<Value> = self
                .sort
                .iter()
                .map(|o| {
                    let mut clause = Map::new();
                    clause.insert(o.property.clone(), json!({ "order": o.direction.as_str() }));
                    Value::Object(clause)
                })
                .collect();
            body.insert("sort".into(), Value::Array(sort));
        }

        let size = match (self.pageable, self.max_results) {
            (Some(p), Some(max)) => Some(p.size.min(max)),
            (Some(p), None) => Some(p.size),
            (None, max) => max,
        };
        if let Some(p) = self.pageable {
            body.insert("from".into(), p.offset().into());
        }
        if let Some(size) = size {
            body.insert("size".into(), size.into());
        }

        if !self.highlight_fields.is_empty() {
            let fields: Map<String, Value> = self
                .highlight_fields
                .iter()
                .map(|f| (f.clone(), json!({})))
                .collect();
            body.insert("highlight".into(), json!({ "fields": fields }));
        }

        Value::Object(body)
    }
}

use std::fmt;

use super::parameter::Parameter;

/// How a criteria node joins its predecessor in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    Exists,
    StartsWith,
    EndsWith,
    Contains,
    /// Raw query expression, e.g. a regular expression.
    Expression,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Between,
    In,
    NotIn,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Equals => "EQUALS",
            Operator::Exists => "EXISTS",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::Contains => "CONTAINS",
            Operator::Expression => "EXPRESSION",
            Operator::Less => "LESS",
            Operator::LessEqual => "LESS_EQUAL",
            Operator::Greater => "GREATER",
            Operator::GreaterEqual => "GREATER_EQUAL",
            Operator::Between => "BETWEEN",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
        };
        f.write_str(name)
    }
}

/// Operand of a predicate, as seen by code that inspects criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Value(Parameter),
    Range(Parameter, Parameter),
    Values(Vec<Parameter>),
}

/// A single predicate on a field. Each operator carries exactly the operand
/// it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaEntry {
    Equals(Parameter),
    Exists,
    StartsWith(Parameter),
    EndsWith(Parameter),
    Contains(Parameter),
    /// Raw query expression, e.g. a regular expression.
    Expression(String),
    Less(Parameter),
    LessEqual(Parameter),
    Greater(Parameter),
    GreaterEqual(Parameter),
    /// Inclusive on both ends.
    Between(Parameter, Parameter),
    In(Vec<Parameter>),
    NotIn(Vec<Parameter>),
}

impl CriteriaEntry {
    pub fn operator(&self) -> Operator {
        match self {
            CriteriaEntry::Equals(_) => Operator::Equals,
            CriteriaEntry::Exists => Operator::Exists,
            CriteriaEntry::StartsWith(_) => Operator::StartsWith,
            CriteriaEntry::EndsWith(_) => Operator::EndsWith,
            CriteriaEntry::Contains(_) => Operator::Contains,
            CriteriaEntry::Expression(_) => Operator::Expression,
            CriteriaEntry::Less(_) => Operator::Less,
            CriteriaEntry::LessEqual(_) => Operator::LessEqual,
            CriteriaEntry::Greater(_) => Operator::Greater,
            CriteriaEntry::GreaterEqual(_) => Operator::GreaterEqual,
            CriteriaEntry::Between(..) => Operator::Between,
            CriteriaEntry::In(_) => Operator::In,
            CriteriaEntry::NotIn(_) => Operator::NotIn,
        }
    }

    pub fn operand(&self) -> Operand {
        match self {
            CriteriaEntry::Exists => Operand::None,
            CriteriaEntry::Expression(expression) => {
                Operand::Value(Parameter::Text(expression.clone()))
            }
            CriteriaEntry::Between(lower, upper) => Operand::Range(lower.clone(), upper.clone()),
            CriteriaEntry::In(values) | CriteriaEntry::NotIn(values) => {
                Operand::Values(values.clone())
            }
            CriteriaEntry::Equals(value)
            | CriteriaEntry::StartsWith(value)
            | CriteriaEntry::EndsWith(value)
            | CriteriaEntry::Contains(value)
            | CriteriaEntry::Less(value)
            | CriteriaEntry::LessEqual(value)
            | CriteriaEntry::Greater(value)
            | CriteriaEntry::GreaterEqual(value) => Operand::Value(value.clone()),
        }
    }
}

/// One node of a boolean query tree: predicates on a field, or a grouped
/// sub-chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Criteria {
    field: Option<String>,
    entries: Vec<CriteriaEntry>,
    negating: bool,
    boost: Option<f32>,
    conjunction: Conjunction,
    group: Option<CriteriaChain>,
}

impl Criteria {
    /// Predicates on a dot separated field path.
    pub fn where_field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    /// A parenthesized sub-chain.
    pub fn group(chain: CriteriaChain) -> Self {
        Self {
            group: Some(chain),
            ..Self::default()
        }
    }

    fn push(mut self, entry: CriteriaEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn is(self, value: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::Equals(value.into()))
    }

    pub fn exists(self) -> Self {
        self.push(CriteriaEntry::Exists)
    }

    pub fn starts_with(self, value: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::StartsWith(value.into()))
    }

    pub fn ends_with(self, value: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::EndsWith(value.into()))
    }

    pub fn contains(self, value: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::Contains(value.into()))
    }

    pub fn expression(self, expression: impl Into<String>) -> Self {
        self.push(CriteriaEntry::Expression(expression.into()))
    }

    pub fn less_than(self, value: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::Less(value.into()))
    }

    pub fn less_than_equal(self, value: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::LessEqual(value.into()))
    }

    pub fn greater_than(self, value: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::Greater(value.into()))
    }

    pub fn greater_than_equal(self, value: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::GreaterEqual(value.into()))
    }

    /// Inclusive on both ends.
    pub fn between(self, lower: impl Into<Parameter>, upper: impl Into<Parameter>) -> Self {
        self.push(CriteriaEntry::Between(lower.into(), upper.into()))
    }

    pub fn in_values(self, values: Vec<Parameter>) -> Self {
        self.push(CriteriaEntry::In(values))
    }

    pub fn not_in(self, values: Vec<Parameter>) -> Self {
        self.push(CriteriaEntry::NotIn(values))
    }

    pub fn not(mut self) -> Self {
        self.negating = true;
        self
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn entries(&self) -> &[CriteriaEntry] {
        &self.entries
    }

    pub fn is_negating(&self) -> bool {
        self.negating
    }

    pub fn boost_value(&self) -> Option<f32> {
        self.boost
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    pub fn sub_chain(&self) -> Option<&CriteriaChain> {
        self.group.as_ref()
    }
}

/// Ordered criteria nodes, each joined to its predecessor by its conjunction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CriteriaChain {
    nodes: Vec<Criteria>,
}

impl CriteriaChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(criteria: Criteria) -> Self {
        Self::new().and(criteria)
    }

    pub fn and(mut self, mut criteria: Criteria) -> Self {
        criteria.conjunction = Conjunction::And;
        self.nodes.push(criteria);
        self
    }

    /// Join `other` as an alternative to everything accumulated so far.
    ///
    /// A multi-node conjunction on the left is grouped before the join, so
    /// nodes added with [`and`](Self::and) afterwards bind to `other` only.
    pub fn or(self, other: CriteriaChain) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }

        let mut left = if self.nodes.len() == 1 || self.is_disjunction() {
            self
        } else {
            CriteriaChain::of(Criteria::group(self))
        };

        let mut right = if other.nodes.len() == 1 {
            let mut nodes = other.nodes;
            nodes.remove(0)
        } else {
            Criteria::group(other)
        };
        right.conjunction = Conjunction::Or;
        left.nodes.push(right);
        left
    }

    pub fn nodes(&self) -> &[Criteria] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_disjunction(&self) -> bool {
        self.nodes.iter().any(|n| n.conjunction == Conjunction::Or)
    }

    /// Maximal runs of AND-joined nodes, split where a node joins with OR.
    pub fn and_runs(&self) -> Vec<&[Criteria]> {
        let mut runs = Vec::new();
        let mut start = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > start && node.conjunction == Conjunction::Or {
                runs.push(&self.nodes[start..i]);
                start = i;
            }
        }
        if start < self.nodes.len() {
            runs.push(&self.nodes[start..]);
        }
        runs
    }
}

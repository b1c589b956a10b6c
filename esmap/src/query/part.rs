//! Method-name grammar of derived queries
//!
//! `findDistinctTop3ByAuthorNameAndPriceLessThanOrTitleContainingOrderByPriceDesc`
//! splits into a subject (`findDistinctTop3`), OR-separated groups of
//! AND-joined parts, and a sort clause.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use super::criteria_query::{Direction, Order};
use crate::{Error, Result};

static SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(find|read|get|query|search|stream|count|exists|delete|remove)((\p{Lu}.*?))??By")
        .expect("subject pattern is valid")
});

static SUBJECT_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(find|read|get|query|search|stream|count|exists|delete|remove)(\p{Lu}.*)?$")
        .expect("subject-only pattern is valid")
});

static LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(First|Top)(\d*)").expect("limit pattern is valid"));

static ORDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)(Asc|Desc)?$").expect("order pattern is valid"));

const ORDER_BY: &str = "OrderBy";
const IGNORE_CASE: [&str; 2] = ["IgnoreCase", "IgnoringCase"];
const ALL_IGNORE_CASE: [&str; 2] = ["AllIgnoreCase", "AllIgnoringCase"];

/// Predicate keyword of a part, detected by suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    IsNotNull,
    IsNull,
    Between,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Before,
    After,
    NotLike,
    Like,
    StartingWith,
    EndingWith,
    IsNotEmpty,
    IsEmpty,
    NotContaining,
    Containing,
    NotIn,
    In,
    Near,
    Within,
    Regex,
    Exists,
    True,
    False,
    NegatingSimpleProperty,
    SimpleProperty,
}

impl Keyword {
    /// Detection order: the first keyword with a matching suffix wins.
    pub const ALL: [Keyword; 27] = [
        Keyword::IsNotNull,
        Keyword::IsNull,
        Keyword::Between,
        Keyword::LessThan,
        Keyword::LessThanEqual,
        Keyword::GreaterThan,
        Keyword::GreaterThanEqual,
        Keyword::Before,
        Keyword::After,
        Keyword::NotLike,
        Keyword::Like,
        Keyword::StartingWith,
        Keyword::EndingWith,
        Keyword::IsNotEmpty,
        Keyword::IsEmpty,
        Keyword::NotContaining,
        Keyword::Containing,
        Keyword::NotIn,
        Keyword::In,
        Keyword::Near,
        Keyword::Within,
        Keyword::Regex,
        Keyword::Exists,
        Keyword::True,
        Keyword::False,
        Keyword::NegatingSimpleProperty,
        Keyword::SimpleProperty,
    ];

    /// Suffixes that select this keyword.
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Keyword::IsNotNull => &["IsNotNull", "NotNull"],
            Keyword::IsNull => &["IsNull", "Null"],
            Keyword::Between => &["IsBetween", "Between"],
            Keyword::LessThan => &["IsLessThan", "LessThan"],
            Keyword::LessThanEqual => &["IsLessThanEqual", "LessThanEqual"],
            Keyword::GreaterThan => &["IsGreaterThan", "GreaterThan"],
            Keyword::GreaterThanEqual => &["IsGreaterThanEqual", "GreaterThanEqual"],
            Keyword::Before => &["IsBefore", "Before"],
            Keyword::After => &["IsAfter", "After"],
            Keyword::NotLike => &["IsNotLike", "NotLike"],
            Keyword::Like => &["IsLike", "Like"],
            Keyword::StartingWith => &["IsStartingWith", "StartingWith", "StartsWith"],
            Keyword::EndingWith => &["IsEndingWith", "EndingWith", "EndsWith"],
            Keyword::IsNotEmpty => &["IsNotEmpty", "NotEmpty"],
            Keyword::IsEmpty => &["IsEmpty", "Empty"],
            Keyword::NotContaining => &["IsNotContaining", "NotContaining", "NotContains"],
            Keyword::Containing => &["IsContaining", "Containing", "Contains"],
            Keyword::NotIn => &["IsNotIn", "NotIn"],
            Keyword::In => &["IsIn", "In"],
            Keyword::Near => &["IsNear", "Near"],
            Keyword::Within => &["IsWithin", "Within"],
            Keyword::Regex => &["MatchesRegex", "Matches", "Regex"],
            Keyword::Exists => &["Exists"],
            Keyword::True => &["IsTrue", "True"],
            Keyword::False => &["IsFalse", "False"],
            Keyword::NegatingSimpleProperty => &["IsNot", "Not"],
            Keyword::SimpleProperty => &["Is", "Equals"],
        }
    }

    /// Number of method arguments the keyword consumes.
    pub fn arguments(&self) -> usize {
        match self {
            Keyword::Between => 2,
            Keyword::IsNotNull
            | Keyword::IsNull
            | Keyword::IsNotEmpty
            | Keyword::IsEmpty
            | Keyword::Exists
            | Keyword::True
            | Keyword::False => 0,
            _ => 1,
        }
    }

    /// Keyword of a part expression; plain property names are `SimpleProperty`.
    pub fn detect(expression: &str) -> Keyword {
        Keyword::ALL
            .into_iter()
            .find(|k| k.matches(expression))
            .unwrap_or(Keyword::SimpleProperty)
    }

    fn matches(&self, expression: &str) -> bool {
        self.suffixes()
            .iter()
            .any(|s| expression.len() > s.len() && expression.ends_with(s))
    }

    /// The property part of `expression` with this keyword's suffix removed.
    pub fn strip<'a>(&self, expression: &'a str) -> &'a str {
        self.suffixes()
            .iter()
            .filter(|s| expression.len() > s.len())
            .find_map(|s| expression.strip_suffix(s))
            .unwrap_or(expression)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Keyword::IsNotNull => "IS_NOT_NULL",
            Keyword::IsNull => "IS_NULL",
            Keyword::Between => "BETWEEN",
            Keyword::LessThan => "LESS_THAN",
            Keyword::LessThanEqual => "LESS_THAN_EQUAL",
            Keyword::GreaterThan => "GREATER_THAN",
            Keyword::GreaterThanEqual => "GREATER_THAN_EQUAL",
            Keyword::Before => "BEFORE",
            Keyword::After => "AFTER",
            Keyword::NotLike => "NOT_LIKE",
            Keyword::Like => "LIKE",
            Keyword::StartingWith => "STARTING_WITH",
            Keyword::EndingWith => "ENDING_WITH",
            Keyword::IsNotEmpty => "IS_NOT_EMPTY",
            Keyword::IsEmpty => "IS_EMPTY",
            Keyword::NotContaining => "NOT_CONTAINING",
            Keyword::Containing => "CONTAINING",
            Keyword::NotIn => "NOT_IN",
            Keyword::In => "IN",
            Keyword::Near => "NEAR",
            Keyword::Within => "WITHIN",
            Keyword::Regex => "REGEX",
            Keyword::Exists => "EXISTS",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::NegatingSimpleProperty => "NEGATING_SIMPLE_PROPERTY",
            Keyword::SimpleProperty => "SIMPLE_PROPERTY",
        };
        f.write_str(name)
    }
}

/// One predicate of a method name, e.g. `PriceLessThan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    expression: String,
    property: String,
    keyword: Keyword,
    ignore_case: bool,
}

impl Part {
    pub fn parse(source: &str, always_ignore_case: bool) -> Self {
        let (expression, ignore_case) = match IGNORE_CASE.iter().find_map(|s| source.strip_suffix(s)) {
            Some(stripped) if !stripped.is_empty() => (stripped, true),
            _ => (source, always_ignore_case),
        };
        let keyword = Keyword::detect(expression);
        Self {
            expression: expression.to_string(),
            property: keyword.strip(expression).to_string(),
            keyword,
            ignore_case,
        }
    }

    /// The part without any ignore-case suffix, e.g. `PriceLessThan`.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The property path as written in the method name, e.g. `Price`.
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Read the whole expression as a plain property, for names such as
    /// `LoggedIn` that happen to end in a keyword.
    pub fn as_simple_property(&self) -> Part {
        Part {
            expression: self.expression.clone(),
            property: self.expression.clone(),
            keyword: Keyword::SimpleProperty,
            ignore_case: self.ignore_case,
        }
    }
}

/// AND-joined parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrPart {
    parts: Vec<Part>,
}

impl OrPart {
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }
}

/// What the method does with its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Find,
    Stream,
    Count,
    Exists,
    Delete,
}

/// A parsed derived-query method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTree {
    source: String,
    kind: SubjectKind,
    distinct: bool,
    max_results: Option<usize>,
    nodes: Vec<OrPart>,
    sort: Vec<Order>,
}

impl PartTree {
    pub fn parse(method_name: &str) -> Result<Self> {
        let (prefix, subject, predicate) = if let Some(caps) = SUBJECT.captures(method_name) {
            let whole = caps.get(0).map_or(0, |m| m.end());
            (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str()),
                &method_name[whole..],
            )
        } else if let Some(caps) = SUBJECT_ONLY.captures(method_name) {
            (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str()),
                "",
            )
        } else {
            return Err(Error::query_parse(
                method_name,
                "method name must start with find, read, get, query, search, stream, count, exists, delete or remove",
            ));
        };

        let kind = match prefix {
            "stream" => SubjectKind::Stream,
            "count" => SubjectKind::Count,
            "exists" => SubjectKind::Exists,
            "delete" | "remove" => SubjectKind::Delete,
            _ => SubjectKind::Find,
        };

        let max_results = match LIMIT.captures(subject) {
            Some(caps) => {
                let digits = caps.get(2).map_or("", |m| m.as_str());
                if digits.is_empty() {
                    Some(1)
                } else {
                    let limit = digits.parse::<usize>().map_err(|e| {
                        Error::query_parse(method_name, format!("invalid result limit {digits}: {e}"))
                    })?;
                    Some(limit)
                }
            }
            None => None,
        };

        let (criteria, order) = split_order_by(method_name, predicate)?;
        let sort = match order {
            Some(clause) => parse_order(method_name, clause)?,
            None => Vec::new(),
        };

        let (criteria, always_ignore_case) =
            match ALL_IGNORE_CASE.iter().find_map(|s| criteria.strip_suffix(s)) {
                Some(stripped) => (stripped, true),
                None => (criteria, false),
            };

        let mut nodes = Vec::new();
        if !criteria.is_empty() {
            for or_source in split_keyword(criteria, "Or") {
                let parts = split_keyword(or_source, "And")
                    .into_iter()
                    .map(|source| {
                        if source.is_empty() {
                            Err(Error::query_parse(method_name, "empty predicate part"))
                        } else {
                            Ok(Part::parse(source, always_ignore_case))
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;
                nodes.push(OrPart { parts });
            }
        }

        Ok(Self {
            source: method_name.to_string(),
            kind,
            distinct: subject.contains("Distinct"),
            max_results,
            nodes,
            sort,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Set by `First` or `Top<N>` in the subject.
    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    pub fn nodes(&self) -> &[OrPart] {
        &self.nodes
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.nodes.iter().flat_map(|n| n.parts.iter())
    }

    pub fn sort(&self) -> &[Order] {
        &self.sort
    }
}

fn split_order_by<'a>(method_name: &str, predicate: &'a str) -> Result<(&'a str, Option<&'a str>)> {
    let mut pieces = predicate.splitn(3, ORDER_BY);
    let criteria = pieces.next().unwrap_or("");
    let order = pieces.next();
    if pieces.next().is_some() {
        return Err(Error::query_parse(method_name, "OrderBy must not be used more than once"));
    }
    Ok((criteria, order))
}

/// `NameAscPriceDesc` -> name ascending, price descending.
fn parse_order(method_name: &str, clause: &str) -> Result<Vec<Order>> {
    if clause.is_empty() {
        return Err(Error::query_parse(method_name, "OrderBy needs at least one property"));
    }

    let mut orders = Vec::new();
    for source in split_after_direction(clause) {
        let caps = ORDER
            .captures(source)
            .ok_or_else(|| Error::query_parse(method_name, format!("invalid order clause {source}")))?;
        let property = caps.get(1).map_or("", |m| m.as_str());
        let direction = match caps.get(2).map(|m| m.as_str()) {
            Some("Desc") => Direction::Desc,
            _ => Direction::Asc,
        };
        orders.push(Order::new(property, direction));
    }
    Ok(orders)
}

/// Split after every `Asc`/`Desc` that is followed by an uppercase letter.
fn split_after_direction(clause: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let bytes = clause.as_bytes();
    let mut i = 0;
    while i < clause.len() {
        let rest = &clause[i..];
        let matched = ["Desc", "Asc"].iter().find(|d| rest.starts_with(**d)).copied();
        if let Some(direction) = matched {
            let end = i + direction.len();
            let next_upper = bytes.get(end).is_some_and(|b| b.is_ascii_uppercase());
            if i > start && next_upper {
                pieces.push(&clause[start..end]);
                start = end;
                i = end;
                continue;
            }
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    pieces.push(&clause[start..]);
    pieces
}

/// Split `text` on `keyword` where the keyword starts a new camel-case word
/// and is itself followed by one.
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut search = 0;

    while let Some(found) = text[search..].find(keyword) {
        let at = search + found;
        let end = at + keyword.len();
        let next_upper = text[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || !c.is_ascii());
        if at > start && next_upper {
            pieces.push(&text[start..at]);
            start = end;
            search = end;
        } else {
            search = at + 1;
        }
    }

    pieces.push(&text[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(tree: &PartTree) -> Vec<(String, Keyword)> {
        tree.parts()
            .map(|p| (p.property().to_string(), p.keyword()))
            .collect()
    }

    #[test]
    fn test_and_parts() {
        let tree = PartTree::parse("findByNameAndPriceGreaterThan").unwrap();
        assert_eq!(tree.kind(), SubjectKind::Find);
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(
            keywords(&tree),
            vec![
                ("Name".to_string(), Keyword::SimpleProperty),
                ("Price".to_string(), Keyword::GreaterThan),
            ]
        );
    }

    #[test]
    fn test_or_and_precedence() {
        let tree = PartTree::parse("findByNameOrPriceLessThanAndAvailableTrue").unwrap();
        assert_eq!(tree.nodes().len(), 2);
        assert_eq!(tree.nodes()[0].parts().len(), 1);
        assert_eq!(tree.nodes()[1].parts().len(), 2);
        assert_eq!(tree.nodes()[1].parts()[1].keyword(), Keyword::True);
    }

    #[test]
    fn test_keywords_inside_words_do_not_split() {
        let tree = PartTree::parse("findByOrderIdAndBrandName").unwrap();
        assert_eq!(tree.nodes().len(), 1);
        let properties: Vec<_> = tree.parts().map(|p| p.property().to_string()).collect();
        assert_eq!(properties, vec!["OrderId", "BrandName"]);
    }

    #[test]
    fn test_subject() {
        let tree = PartTree::parse("findDistinctTop10ByName").unwrap();
        assert!(tree.is_distinct());
        assert_eq!(tree.max_results(), Some(10));

        let tree = PartTree::parse("findFirstByName").unwrap();
        assert_eq!(tree.max_results(), Some(1));

        assert_eq!(PartTree::parse("countByName").unwrap().kind(), SubjectKind::Count);
        assert_eq!(PartTree::parse("existsByName").unwrap().kind(), SubjectKind::Exists);
        assert_eq!(PartTree::parse("deleteByName").unwrap().kind(), SubjectKind::Delete);
        assert_eq!(PartTree::parse("removeByName").unwrap().kind(), SubjectKind::Delete);
        assert_eq!(PartTree::parse("streamByName").unwrap().kind(), SubjectKind::Stream);
        assert_eq!(PartTree::parse("searchByName").unwrap().kind(), SubjectKind::Find);
    }

    #[test]
    fn test_subject_without_predicate() {
        let tree = PartTree::parse("findAll").unwrap();
        assert!(tree.nodes().is_empty());
        let tree = PartTree::parse("count").unwrap();
        assert_eq!(tree.kind(), SubjectKind::Count);
    }

    #[test]
    fn test_order_by() {
        let tree = PartTree::parse("findByAvailableTrueOrderByPriceDescNameAsc").unwrap();
        assert_eq!(
            tree.sort(),
            &[
                Order::new("Price", Direction::Desc),
                Order::new("Name", Direction::Asc),
            ]
        );

        let tree = PartTree::parse("findAllByOrderByName").unwrap();
        assert!(tree.nodes().is_empty());
        assert_eq!(tree.sort(), &[Order::new("Name", Direction::Asc)]);

        assert!(PartTree::parse("findByNameOrderByPriceOrderByName").is_err());
    }

    #[test]
    fn test_ignore_case() {
        let tree = PartTree::parse("findByNameIgnoreCaseAndTitle").unwrap();
        let parts: Vec<_> = tree.parts().collect();
        assert!(parts[0].ignore_case());
        assert_eq!(parts[0].property(), "Name");
        assert!(!parts[1].ignore_case());

        let tree = PartTree::parse("findByNameAndTitleAllIgnoreCase").unwrap();
        assert!(tree.parts().all(|p| p.ignore_case()));
        assert_eq!(tree.parts().last().unwrap().property(), "Title");
    }

    #[test]
    fn test_keyword_detection_order() {
        assert_eq!(Keyword::detect("PriceLessThanEqual"), Keyword::LessThanEqual);
        assert_eq!(Keyword::detect("PriceLessThan"), Keyword::LessThan);
        assert_eq!(Keyword::detect("NameIsNotNull"), Keyword::IsNotNull);
        assert_eq!(Keyword::detect("NameNotIn"), Keyword::NotIn);
        assert_eq!(Keyword::detect("NameNotContaining"), Keyword::NotContaining);
        assert_eq!(Keyword::detect("NameNot"), Keyword::NegatingSimpleProperty);
        assert_eq!(Keyword::detect("NameMatchesRegex"), Keyword::Regex);
        assert_eq!(Keyword::detect("Name"), Keyword::SimpleProperty);
        assert_eq!(Keyword::detect("NameEquals"), Keyword::SimpleProperty);
        // A bare keyword is a property name.
        assert_eq!(Keyword::detect("In"), Keyword::SimpleProperty);
    }

    #[test]
    fn test_strip() {
        assert_eq!(Keyword::StartingWith.strip("NameStartsWith"), "Name");
        assert_eq!(Keyword::Between.strip("PriceIsBetween"), "Price");
        assert_eq!(Keyword::SimpleProperty.strip("NameIs"), "Name");
        assert_eq!(Keyword::SimpleProperty.strip("Name"), "Name");
    }

    #[test]
    fn test_every_keyword_round_trips_through_its_suffix() {
        for keyword in Keyword::ALL {
            let suffix = keyword.suffixes()[0];
            let part = Part::parse(&format!("Field{suffix}"), false);
            assert_eq!(part.keyword(), keyword, "suffix {suffix}");
            assert_eq!(part.property(), "Field");
        }
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(
            PartTree::parse("lookupByName"),
            Err(Error::QueryParse { .. })
        ));
    }
}

use std::slice;
use std::sync::Arc;

use super::criteria::{Criteria, CriteriaChain};
use super::criteria_query::{CriteriaQuery, ExecutionShape, Order, QueryMethod, ReturnKind};
use super::parameter::Parameter;
use super::part::{Keyword, Part, PartTree};
use crate::metadata::{MappingContext, PersistentEntity, PropertyPath};
use crate::{Error, Result};

/// Turns parsed method names into criteria queries against one entity.
pub struct QueryCreator<'a> {
    context: &'a MappingContext,
    entity: Arc<PersistentEntity>,
}

impl<'a> QueryCreator<'a> {
    pub fn new(context: &'a MappingContext, entity: Arc<PersistentEntity>) -> Self {
        Self { context, entity }
    }

    pub fn for_entity(context: &'a MappingContext, type_name: &str) -> Result<Self> {
        Ok(Self::new(context, context.get_or_create_entity(type_name)?))
    }

    /// Parse the method name and build its query, with the method's
    /// pagination, highlighting and execution shape applied.
    pub fn create_for_method(&self, method: &QueryMethod, parameters: &[Parameter]) -> Result<CriteriaQuery> {
        let tree = PartTree::parse(&method.name)?;
        let query = self
            .create(&tree, parameters)?
            .with_pageable(method.pageable)
            .with_highlight_fields(method.highlight_fields.clone())
            .with_shape(ExecutionShape::derive(tree.kind(), method.return_kind));
        Ok(query)
    }

    /// Parts within an OR group are AND-joined; OR groups are merged into a
    /// disjunction in method-name order.
    pub fn create(&self, tree: &PartTree, parameters: &[Parameter]) -> Result<CriteriaQuery> {
        let mut arguments = parameters.iter();
        let mut base: Option<CriteriaChain> = None;

        for node in tree.nodes() {
            let mut chain: Option<CriteriaChain> = None;
            for part in node.parts() {
                let criteria = self.from_part(tree, part, &mut arguments)?;
                chain = Some(match chain {
                    None => CriteriaChain::of(criteria),
                    Some(chain) => chain.and(criteria),
                });
            }
            if let Some(chain) = chain {
                base = Some(match base {
                    None => chain,
                    Some(base) => base.or(chain),
                });
            }
        }

        let sort = tree
            .sort()
            .iter()
            .map(|order| {
                let path = self.context.resolve_method_path(&self.entity, &order.property)?;
                Ok(Order::new(path.field_path(), order.direction))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CriteriaQuery::new(base.unwrap_or_default())
            .with_sort(sort)
            .with_max_results(tree.max_results())
            .with_distinct(tree.is_distinct())
            .with_shape(ExecutionShape::derive(tree.kind(), ReturnKind::default())))
    }

    fn from_part(
        &self,
        tree: &PartTree,
        part: &Part,
        arguments: &mut slice::Iter<'_, Parameter>,
    ) -> Result<Criteria> {
        let (path, keyword) = self.resolve(part)?;
        let field = path.field_path();
        tracing::trace!(method = %tree.source(), field = %field, keyword = %keyword, "derived criteria");

        let criteria = Criteria::where_field(field.as_str());
        let mut next = || {
            arguments.next().cloned().ok_or_else(|| {
                Error::query_parse(
                    tree.source(),
                    format!("missing argument for {keyword} on {field}"),
                )
            })
        };

        let criteria = match keyword {
            Keyword::True => criteria.is(true),
            Keyword::False => criteria.is(false),
            Keyword::NegatingSimpleProperty => criteria.is(next()?).not(),
            Keyword::Regex => criteria.expression(next()?.to_query_string()),
            Keyword::Like | Keyword::StartingWith => criteria.starts_with(next()?),
            Keyword::EndingWith => criteria.ends_with(next()?),
            Keyword::Containing => criteria.contains(next()?),
            Keyword::GreaterThan => criteria.greater_than(next()?),
            Keyword::After | Keyword::GreaterThanEqual => criteria.greater_than_equal(next()?),
            Keyword::LessThan => criteria.less_than(next()?),
            Keyword::Before | Keyword::LessThanEqual => criteria.less_than_equal(next()?),
            Keyword::Between => {
                let lower = next()?;
                let upper = next()?;
                criteria.between(lower, upper)
            }
            Keyword::In => criteria.in_values(next()?.to_list()),
            Keyword::NotIn => criteria.not_in(next()?.to_list()),
            Keyword::SimpleProperty => {
                let value = next()?;
                if value.is_null() {
                    criteria.exists().not()
                } else {
                    criteria.is(value)
                }
            }
            Keyword::Near | Keyword::Within => {
                return Err(Error::UnsupportedFeature(format!(
                    "{keyword} criteria in {}",
                    tree.source()
                )));
            }
            Keyword::IsNotNull
            | Keyword::IsNull
            | Keyword::NotLike
            | Keyword::IsNotEmpty
            | Keyword::IsEmpty
            | Keyword::NotContaining
            | Keyword::Exists => {
                return Err(Error::query_parse(
                    tree.source(),
                    format!("Illegal criteria found '{keyword}'"),
                ));
            }
        };

        Ok(criteria)
    }

    /// A part whose stripped property is unknown but whose whole expression
    /// names a property is a plain equality on that property.
    fn resolve(&self, part: &Part) -> Result<(PropertyPath, Keyword)> {
        match self.context.resolve_method_path(&self.entity, part.property()) {
            Ok(path) => Ok((path, part.keyword())),
            Err(e @ Error::PropertyNotFound { .. }) if part.keyword() != Keyword::SimpleProperty => {
                let simple = part.as_simple_property();
                match self.context.resolve_method_path(&self.entity, simple.property()) {
                    Ok(path) => Ok((path, Keyword::SimpleProperty)),
                    Err(Error::PropertyNotFound { .. }) => Err(e),
                    Err(other) => Err(other),
                }
            }
            Err(e) => Err(e),
        }
    }
}

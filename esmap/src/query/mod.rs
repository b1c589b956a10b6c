//! Derived and string queries
//!
//! Method names such as `findByNameAndPriceGreaterThan` are parsed into a
//! [`PartTree`], turned into a [`CriteriaChain`] by the [`QueryCreator`] and
//! rendered to query DSL by the [`CriteriaQueryProcessor`]. Hand written
//! templates go through [`StringQuery`].

pub mod creator;
pub mod criteria;
pub mod criteria_query;
pub mod parameter;
pub mod part;
pub mod processor;
pub mod string_query;

pub use creator::QueryCreator;
pub use criteria::{Conjunction, Criteria, CriteriaChain, CriteriaEntry, Operand, Operator};
pub use criteria_query::{
    CriteriaQuery, Direction, ExecutionShape, Order, Pageable, QueryMethod, ReturnKind,
};
pub use parameter::Parameter;
pub use part::{Keyword, OrPart, Part, PartTree, SubjectKind};
pub use processor::CriteriaQueryProcessor;
pub use string_query::StringQuery;

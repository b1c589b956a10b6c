use serde::{Deserialize, Serialize};

/// Elasticsearch field datatypes a property can be mapped as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Let the cluster detect the type; no `type` is written.
    #[default]
    Auto,
    Text,
    Keyword,
    ConstantKeyword,
    Wildcard,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    Date,
    DateNanos,
    Boolean,
    Binary,
    Ip,
    TokenCount,
    Object,
    Nested,
    Flattened,
    SearchAsYouType,
    DenseVector,
    RankFeature,
    RankFeatures,
    IntegerRange,
    LongRange,
    FloatRange,
    DoubleRange,
    DateRange,
    IpRange,
}

impl FieldType {
    /// Name written to the mapping document, `None` for [`FieldType::Auto`].
    pub fn mapped_name(&self) -> Option<&'static str> {
        let name = match self {
            FieldType::Auto => return None,
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::ConstantKeyword => "constant_keyword",
            FieldType::Wildcard => "wildcard",
            FieldType::Long => "long",
            FieldType::Integer => "integer",
            FieldType::Short => "short",
            FieldType::Byte => "byte",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::HalfFloat => "half_float",
            FieldType::ScaledFloat => "scaled_float",
            FieldType::Date => "date",
            FieldType::DateNanos => "date_nanos",
            FieldType::Boolean => "boolean",
            FieldType::Binary => "binary",
            FieldType::Ip => "ip",
            FieldType::TokenCount => "token_count",
            FieldType::Object => "object",
            FieldType::Nested => "nested",
            FieldType::Flattened => "flattened",
            FieldType::SearchAsYouType => "search_as_you_type",
            FieldType::DenseVector => "dense_vector",
            FieldType::RankFeature => "rank_feature",
            FieldType::RankFeatures => "rank_features",
            FieldType::IntegerRange => "integer_range",
            FieldType::LongRange => "long_range",
            FieldType::FloatRange => "float_range",
            FieldType::DoubleRange => "double_range",
            FieldType::DateRange => "date_range",
            FieldType::IpRange => "ip_range",
        };
        Some(name)
    }

    pub fn is_date(&self) -> bool {
        matches!(
            self,
            FieldType::Date | FieldType::DateNanos | FieldType::DateRange
        )
    }

    pub fn is_nested_or_object(&self) -> bool {
        matches!(self, FieldType::Nested | FieldType::Object)
    }
}

/// Date formats built into Elasticsearch, plus `custom` for a user supplied pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    None,
    Custom,
    BasicDate,
    BasicDateTime,
    BasicDateTimeNoMillis,
    BasicTime,
    BasicTimeNoMillis,
    Date,
    DateHour,
    DateHourMinute,
    DateHourMinuteSecond,
    DateHourMinuteSecondMillis,
    DateOptionalTime,
    DateTime,
    DateTimeNoMillis,
    EpochMillis,
    EpochSecond,
    Hour,
    StrictDate,
    StrictDateOptionalTime,
    StrictDateTime,
    StrictDateTimeNoMillis,
    Time,
    TimeNoMillis,
    WeekDate,
    Year,
    YearMonth,
    YearMonthDay,
}

impl DateFormat {
    /// Built-in format name as Elasticsearch spells it.
    pub fn mapped_name(&self) -> &'static str {
        match self {
            DateFormat::None => "none",
            DateFormat::Custom => "custom",
            DateFormat::BasicDate => "basic_date",
            DateFormat::BasicDateTime => "basic_date_time",
            DateFormat::BasicDateTimeNoMillis => "basic_date_time_no_millis",
            DateFormat::BasicTime => "basic_time",
            DateFormat::BasicTimeNoMillis => "basic_time_no_millis",
            DateFormat::Date => "date",
            DateFormat::DateHour => "date_hour",
            DateFormat::DateHourMinute => "date_hour_minute",
            DateFormat::DateHourMinuteSecond => "date_hour_minute_second",
            DateFormat::DateHourMinuteSecondMillis => "date_hour_minute_second_millis",
            DateFormat::DateOptionalTime => "date_optional_time",
            DateFormat::DateTime => "date_time",
            DateFormat::DateTimeNoMillis => "date_time_no_millis",
            DateFormat::EpochMillis => "epoch_millis",
            DateFormat::EpochSecond => "epoch_second",
            DateFormat::Hour => "hour",
            DateFormat::StrictDate => "strict_date",
            DateFormat::StrictDateOptionalTime => "strict_date_optional_time",
            DateFormat::StrictDateTime => "strict_date_time",
            DateFormat::StrictDateTimeNoMillis => "strict_date_time_no_millis",
            DateFormat::Time => "time",
            DateFormat::TimeNoMillis => "time_no_millis",
            DateFormat::WeekDate => "week_date",
            DateFormat::Year => "year",
            DateFormat::YearMonth => "year_month",
            DateFormat::YearMonthDay => "year_month_day",
        }
    }
}

/// Dynamic mapping mode of an object level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dynamic {
    True,
    False,
    Strict,
    Runtime,
    /// Take the parent's setting; nothing is written.
    Inherit,
}

impl Dynamic {
    pub fn mapped_value(&self) -> Option<&'static str> {
        match self {
            Dynamic::True => Some("true"),
            Dynamic::False => Some("false"),
            Dynamic::Strict => Some("strict"),
            Dynamic::Runtime => Some("runtime"),
            Dynamic::Inherit => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermVector {
    No,
    Yes,
    WithPositions,
    WithOffsets,
    WithPositionsOffsets,
    WithPositionsPayloads,
    WithPositionsOffsetsPayloads,
}

impl TermVector {
    pub fn mapped_name(&self) -> &'static str {
        match self {
            TermVector::No => "no",
            TermVector::Yes => "yes",
            TermVector::WithPositions => "with_positions",
            TermVector::WithOffsets => "with_offsets",
            TermVector::WithPositionsOffsets => "with_positions_offsets",
            TermVector::WithPositionsPayloads => "with_positions_payloads",
            TermVector::WithPositionsOffsetsPayloads => "with_positions_offsets_payloads",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOptions {
    Docs,
    Freqs,
    Positions,
    Offsets,
}

impl IndexOptions {
    pub fn mapped_name(&self) -> &'static str {
        match self {
            IndexOptions::Docs => "docs",
            IndexOptions::Freqs => "freqs",
            IndexOptions::Positions => "positions",
            IndexOptions::Offsets => "offsets",
        }
    }
}

/// The value type a property holds in the domain object.
///
/// In YAML schemas scalar types are plain strings (`type: string`), entity
/// references are maps (`type: { entity: Author }`) and collections wrap
/// another value type (`type: { list: { entity: Author } }`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Boolean,
    Date,
    DateTime,
    Binary,
    Uuid,
    GeoPoint,
    Completion,
    SeqNoPrimaryTerm,
    /// Another mapped entity, by type name.
    Entity(String),
    List(Box<ValueType>),
}

impl ValueType {
    pub fn entity(name: impl Into<String>) -> Self {
        ValueType::Entity(name.into())
    }

    pub fn list_of(inner: ValueType) -> Self {
        ValueType::List(Box::new(inner))
    }

    /// The element type for collections, the type itself otherwise.
    pub fn actual_type(&self) -> &ValueType {
        match self {
            ValueType::List(inner) => inner.actual_type(),
            other => other,
        }
    }

    /// Name of the mapped entity this value refers to, looking through collections.
    pub fn entity_name(&self) -> Option<&str> {
        match self.actual_type() {
            ValueType::Entity(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ValueType::List(_))
    }

    pub(crate) fn is_valid_id_type(&self) -> bool {
        matches!(
            self,
            ValueType::String | ValueType::Integer | ValueType::Long | ValueType::Uuid
        )
    }

    pub(crate) fn is_valid_version_type(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Long)
    }
}

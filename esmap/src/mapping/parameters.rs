//! Field mapping parameters written for a single [`FieldSpec`].

use serde_json::{Map, Value};

use crate::metadata::{DateFormat, FieldSpec, FieldType};

/// Write the `type` and all non-default parameters of `spec` into `node`.
pub(crate) fn write_field_parameters(spec: &FieldSpec, node: &mut Map<String, Value>) {
    if let Some(name) = spec.field_type.mapped_name() {
        node.insert("type".into(), name.into());
    }

    if spec.field_type.is_nested_or_object() {
        if let Some(dynamic) = spec.dynamic.and_then(|d| d.mapped_value()) {
            node.insert("dynamic".into(), dynamic.into());
        }
    }

    if !spec.index {
        node.insert("index".into(), false.into());
    }

    if spec.field_type.is_date() {
        if let Some(format) = date_format(spec) {
            node.insert("format".into(), format.into());
        }
    }

    if spec.store {
        node.insert("store".into(), true.into());
    }
    if spec.fielddata {
        node.insert("fielddata".into(), true.into());
    }
    if let Some(analyzer) = non_blank(&spec.analyzer) {
        node.insert("analyzer".into(), analyzer.into());
    }
    if let Some(analyzer) = non_blank(&spec.search_analyzer) {
        node.insert("search_analyzer".into(), analyzer.into());
    }
    if let Some(normalizer) = non_blank(&spec.normalizer) {
        node.insert("normalizer".into(), normalizer.into());
    }
    if !spec.copy_to.is_empty() {
        node.insert("copy_to".into(), spec.copy_to.clone().into());
    }
    if let Some(ignore_above) = spec.ignore_above {
        node.insert("ignore_above".into(), ignore_above.into());
    }
    if !spec.doc_values {
        node.insert("doc_values".into(), false.into());
    }
    if !spec.norms {
        node.insert("norms".into(), false.into());
    }
    if let Some(null_value) = non_blank(&spec.null_value) {
        node.insert("null_value".into(), null_value.into());
    }
    if let Some(similarity) = non_blank(&spec.similarity) {
        node.insert("similarity".into(), similarity.into());
    }
    if let Some(term_vector) = spec.term_vector {
        node.insert("term_vector".into(), term_vector.mapped_name().into());
    }
    if let Some(options) = spec.index_options {
        node.insert("index_options".into(), options.mapped_name().into());
    }
    if matches!(
        spec.field_type,
        FieldType::RankFeature | FieldType::RankFeatures
    ) && !spec.positive_score_impact
    {
        node.insert("positive_score_impact".into(), false.into());
    }
    if spec.field_type == FieldType::ScaledFloat {
        if let Some(factor) = spec.scaling_factor {
            node.insert("scaling_factor".into(), factor.into());
        }
    }
    if spec.field_type == FieldType::Nested && spec.include_in_parent {
        node.insert("include_in_parent".into(), true.into());
    }
}

/// Built-in format name, or the literal pattern for custom formats.
fn date_format(spec: &FieldSpec) -> Option<String> {
    match spec.format? {
        DateFormat::None => None,
        DateFormat::Custom => non_blank(&spec.pattern).map(str::to_string),
        builtin => Some(builtin.mapped_name().to_string()),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

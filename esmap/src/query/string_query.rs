use regex::Regex;
use std::sync::LazyLock;

use super::parameter::{escape_quotes, Parameter};
use crate::{Error, Result};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?(\d+)").expect("placeholder pattern is valid"));

/// A query DSL template with zero-based `?N` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringQuery {
    template: String,
}

impl StringQuery {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitute every placeholder with the rendered parameter at its index.
    /// An index may appear any number of times.
    pub fn bind(&self, parameters: &[Parameter]) -> Result<String> {
        let mut bound = String::with_capacity(self.template.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(&self.template) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let parameter = digits
                .as_str()
                .parse::<usize>()
                .ok()
                .and_then(|index| parameters.get(index))
                .ok_or_else(|| {
                    Error::query_parse(
                        &self.template,
                        format!(
                            "placeholder ?{} has no parameter ({} given)",
                            digits.as_str(),
                            parameters.len()
                        ),
                    )
                })?;

            bound.push_str(&self.template[last..whole.start()]);
            bound.push_str(&render(parameter));
            last = whole.end();
        }

        bound.push_str(&self.template[last..]);
        Ok(bound)
    }
}

/// Text is escaped for use inside a JSON string; lists render as a JSON array
/// of strings.
fn render(parameter: &Parameter) -> String {
    match parameter {
        Parameter::List(_) => parameter.to_query_string(),
        other => escape_quotes(&other.to_query_string()),
    }
}

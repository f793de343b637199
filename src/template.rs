//! Detail-pane template: plain text with `{{ field }}` placeholders.

use serde_json::{Map, Value};
use thiserror::Error;

/// Used when no template file is available.
pub const BUILTIN_TEMPLATE: &str = "\
{{ longName }} ({{ symbol }})

Price       {{ currentPrice }}
Change      {{ regularMarketChange }} ({{ regularMarketChangePercent }}%)
Bid / Ask   {{ bid }} / {{ ask }}
Day         {{ dayLow }} - {{ dayHigh }}
52 weeks    {{ fiftyTwoWeekLow }} - {{ fiftyTwoWeekHigh }}
Exchange    {{ fullExchangeName }}
Currency    {{ currency }}
";

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed detail template.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailTemplate {
    segments: Vec<Segment>,
}

impl DetailTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                return Err(TemplateError::Unterminated(offset + start));
            };
            let name = after_open[..end].trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder(offset + start));
            }
            segments.push(Segment::Field(name.to_string()));

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Substitute field values; unknown and null fields render empty.
    pub fn render(&self, fields: &Map<String, Value>) -> String {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Field(name) => match fields.get(name) {
                    None | Some(Value::Null) => {}
                    Some(Value::String(s)) => output.push_str(s),
                    Some(other) => output.push_str(&other.to_string()),
                },
            }
        }
        output
    }
}

impl Default for DetailTemplate {
    fn default() -> Self {
        match Self::parse(BUILTIN_TEMPLATE) {
            Ok(template) => template,
            Err(_) => unreachable!("built-in template is well formed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_render_substitutes_fields() {
        let template = DetailTemplate::parse("# {{longName}}\nbid={{ bid }} open={{open}}").unwrap();
        let rendered = template.render(&fields(json!({
            "longName": "Apple Inc.",
            "bid": 190.25,
            "open": null,
        })));
        assert_eq!(rendered, "# Apple Inc.\nbid=190.25 open=");
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let template = DetailTemplate::parse("[{{ nope }}]").unwrap();
        assert_eq!(template.render(&Map::new()), "[]");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let template = DetailTemplate::parse("just text { not a field }").unwrap();
        assert_eq!(template.render(&Map::new()), "just text { not a field }");
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert_eq!(
            DetailTemplate::parse("ok {{ bid }} then {{ ask"),
            Err(TemplateError::Unterminated(18))
        );
    }

    #[test]
    fn test_empty_placeholder() {
        assert_eq!(
            DetailTemplate::parse("a{{  }}"),
            Err(TemplateError::EmptyPlaceholder(1))
        );
    }

    #[test]
    fn test_builtin_template_parses() {
        let rendered = DetailTemplate::default().render(&fields(json!({"symbol": "AAPL"})));
        assert!(rendered.contains("(AAPL)"));
    }
}

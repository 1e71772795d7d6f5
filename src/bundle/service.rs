//! Fragments of the generated service source derived from the field list.
//!
//! Request-schema members and feature-vector entries are both emitted from a
//! single pass over the same slice, so their order cannot diverge.

use crate::schema::FieldSpec;

const MEMBER_INDENT: &str = "    ";
const ENTRY_INDENT: &str = "        ";

/// Rendered, field-dependent parts of the service source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFragments {
    pub request_fields: String,
    pub feature_vector: String,
    pub input_log: String,
}

impl ServiceFragments {
    pub fn from_fields(fields: &[FieldSpec]) -> Self {
        let mut request_fields = Vec::with_capacity(fields.len());
        let mut feature_vector = Vec::with_capacity(fields.len());
        let mut input_log = Vec::with_capacity(fields.len());

        for field in fields {
            request_fields.push(schema_member(field));
            feature_vector.push(format!("{}input_data.{},", ENTRY_INDENT, field.identifier));
            input_log.push(format!(
                "{}{}: input_data.{},",
                ENTRY_INDENT,
                string_literal(&field.raw_name),
                field.identifier
            ));
        }

        Self {
            request_fields: request_fields.join("\n"),
            feature_vector: feature_vector.join("\n"),
            input_log: input_log.join("\n"),
        }
    }
}

fn schema_member(field: &FieldSpec) -> String {
    let annotation = field.field_type.annotation();
    match field.alias() {
        Some(alias) => format!(
            "{}{}: {} = Field(..., alias={})",
            MEMBER_INDENT,
            field.identifier,
            annotation,
            string_literal(alias)
        ),
        None => format!("{}{}: {}", MEMBER_INDENT, field.identifier, annotation),
    }
}

/// Double-quoted, escaped string literal.
///
/// JSON string syntax is a subset of the generated language's literal syntax.
pub fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Member identifiers declared by a rendered `PredictionInput` class, in order.
pub fn declared_members(service_source: &str) -> Vec<String> {
    let mut members = Vec::new();
    let mut inside = false;

    for line in service_source.lines() {
        if line.starts_with("class PredictionInput") {
            inside = true;
            continue;
        }
        if !inside {
            continue;
        }
        if !line.is_empty() && !line.starts_with(' ') {
            break;
        }
        let trimmed = line.trim();
        if line.starts_with(MEMBER_INDENT) && !line.starts_with(ENTRY_INDENT) {
            if let Some((name, _)) = trimmed.split_once(':') {
                if !name.contains(' ') {
                    members.push(name.to_string());
                }
            }
        }
    }
    members
}

/// Identifiers read into the feature vector of a rendered service, in order.
pub fn assembled_features(service_source: &str) -> Vec<String> {
    let Some(start) = service_source.find("np.array([[") else {
        return Vec::new();
    };
    let body = &service_source[start..];
    let end = body.find("]]").unwrap_or(body.len());

    body[..end]
        .lines()
        .filter_map(|line| line.trim().strip_prefix("input_data."))
        .map(|rest| rest.trim_end_matches(',').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::extract_fields;

    #[test]
    fn test_member_without_alias() {
        let fields = extract_fields(r#"["age"]"#).unwrap();
        let fragments = ServiceFragments::from_fields(&fields);
        assert_eq!(fragments.request_fields, "    age: float");
        assert_eq!(fragments.feature_vector, "        input_data.age,");
    }

    #[test]
    fn test_member_with_alias() {
        let fields = extract_fields(r#"["y-2"]"#).unwrap();
        let fragments = ServiceFragments::from_fields(&fields);
        assert_eq!(
            fragments.request_fields,
            "    y_2: float = Field(..., alias=\"y-2\")"
        );
        assert_eq!(fragments.input_log, "        \"y-2\": input_data.y_2,");
    }

    #[test]
    fn test_alias_is_escaped() {
        let fields = extract_fields(r#"["say \"hi\"\\now"]"#).unwrap();
        let fragments = ServiceFragments::from_fields(&fields);
        assert!(fragments
            .request_fields
            .ends_with(r#"alias="say \"hi\"\\now")"#));
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("plain"), "\"plain\"");
        assert_eq!(string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(string_literal("line\nbreak"), "\"line\\nbreak\"");
    }

    #[test]
    fn test_fragments_follow_field_order() {
        let fields = extract_fields(r#"{"c": 0, "a": 0, "b-x": 0}"#).unwrap();
        let fragments = ServiceFragments::from_fields(&fields);
        let vector: Vec<&str> = fragments.feature_vector.lines().map(str::trim).collect();
        assert_eq!(vector, ["input_data.c,", "input_data.a,", "input_data.b_x,"]);
    }

    #[test]
    fn test_scanners_read_rendered_class() {
        let source = "\
class PredictionInput(BaseModel):
    a: float
    b_c: float = Field(..., alias=\"b-c\")

    class Config:
        allow_population_by_field_name = True


def assemble_features(input_data):
    return np.array([[
        input_data.a,
        input_data.b_c,
    ]], dtype=float)
";
        assert_eq!(declared_members(source), ["a", "b_c"]);
        assert_eq!(assembled_features(source), ["a", "b_c"]);
    }
}

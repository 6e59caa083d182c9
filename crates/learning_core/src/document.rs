//! Field-path helpers shared by document store implementations.

use serde_json::Value;

use crate::ports::Document;

/// Sets every `(path, value)` pair in `fields` on `target`.
///
/// A path is a dot-separated list of keys. Missing or non-object intermediate
/// values are replaced by empty objects.
pub fn apply_fields(target: &mut Document, fields: Document) {
    for (path, value) in fields {
        set_path(target, &path, value);
    }
}

fn set_path(target: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Document::new()));
            if !child.is_object() {
                *child = Value::Object(Document::new());
            }
            if let Value::Object(map) = child {
                set_path(map, rest, value);
            }
        }
    }
}

/// True when `body[field]` holds a non-null value equal to `value`.
pub fn field_equals(body: &Document, field: &str, value: &Value) -> bool {
    match body.get(field) {
        Some(Value::Null) | None => false,
        Some(stored) => stored == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn dotted_paths_update_nested_fields_in_place() {
        let mut body = doc(json!({
            "nameEnglish": "Learner",
            "preferences": { "language": "english", "notifications": true }
        }));
        apply_fields(
            &mut body,
            doc(json!({ "preferences.language": "telugu", "lastLogin": "now" })),
        );

        assert_eq!(body["preferences"]["language"], "telugu");
        assert_eq!(body["preferences"]["notifications"], true);
        assert_eq!(body["lastLogin"], "now");
        assert_eq!(body["nameEnglish"], "Learner");
    }

    #[test]
    fn missing_parents_are_created() {
        let mut body = Document::new();
        apply_fields(&mut body, doc(json!({ "stats.favoriteModule": "numbers" })));
        assert_eq!(Value::Object(body), json!({ "stats": { "favoriteModule": "numbers" } }));
    }

    #[test]
    fn null_never_matches_an_equality_filter() {
        let body = doc(json!({ "email": null, "mobile": "9999999999" }));
        assert!(!field_equals(&body, "email", &Value::Null));
        assert!(field_equals(&body, "mobile", &json!("9999999999")));
        assert!(!field_equals(&body, "userId", &json!("u1")));
    }
}

use std::collections::HashMap;

/// Substitute `{{KEY}}` tokens with per-recipient field values.
///
/// For every field both the upper-cased and the as-given key forms are
/// replaced, so `{{NAME}}` and `{{name}}` resolve from a `name` field. Empty
/// values leave their token verbatim: a visibly unreplaced `{{NAME}}` in a
/// delivered mail is easier to catch than a silently blanked greeting.
/// Unknown tokens are left verbatim. No escaping, no nesting.
pub fn render(template: &str, fields: &HashMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in fields {
        if value.is_empty() {
            continue;
        }
        let upper = format!("{{{{{}}}}}", key.to_uppercase());
        let given = format!("{{{{{}}}}}", key);
        out = out.replace(&upper, value).replace(&given, value);
    }
    out
}

/// Flatten a JSON object into template fields. Scalars are stringified,
/// nested arrays/objects and nulls are dropped.
pub fn fields_from_json(value: &serde_json::Value) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(obj) = value.as_object() {
        for (k, v) in obj {
            let s = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            out.insert(k.clone(), s);
        }
    }
    out
}

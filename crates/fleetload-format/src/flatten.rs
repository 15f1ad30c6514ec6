//! Record flattening.

use serde_json::{Map, Value};

use crate::ConvertError;

/// Separator between the keys of nested objects in a flattened column name.
const SEPARATOR: char = '.';

/// Flattens a JSON object so that nested objects become dotted columns.
///
/// `{"a": {"b": 1}, "c": [1, 2]}` becomes `{"a.b": 1, "c": "[1,2]"}`.
/// Arrays are kept as their JSON text so every column stays scalar.
///
/// # Errors
///
/// Returns an error if `record` is not an object.
pub fn flatten_record(index: usize, record: &Value) -> Result<Map<String, Value>, ConvertError> {
    let Value::Object(object) = record else {
        return Err(ConvertError::NotAnObject { index });
    };

    let mut flat = Map::new();
    flatten_into(&mut flat, None, object);
    Ok(flat)
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{prefix}{SEPARATOR}{key}"),
            None => key.clone(),
        };

        match value {
            Value::Object(nested) if !nested.is_empty() => {
                flatten_into(flat, Some(&name), nested);
            }
            Value::Object(_) => {
                flat.insert(name, Value::Null);
            }
            Value::Array(_) => {
                flat.insert(name, Value::String(value.to_string()));
            }
            scalar => {
                flat.insert(name, scalar.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_record_unchanged() {
        let record = json!({"placa": "ABC1234", "velocidade": 42});
        let flat = flatten_record(0, &record).unwrap();

        assert_eq!(flat.len(), 2);
        assert_eq!(flat["placa"], "ABC1234");
        assert_eq!(flat["velocidade"], 42);
    }

    #[test]
    fn test_nested_objects_become_dotted() {
        let record = json!({
            "veiculo": {"placa": "ABC1234", "posicao": {"lat": -22.9, "lon": -43.2}},
            "linha": "474"
        });
        let flat = flatten_record(0, &record).unwrap();

        assert_eq!(flat["veiculo.placa"], "ABC1234");
        assert_eq!(flat["veiculo.posicao.lat"], -22.9);
        assert_eq!(flat["veiculo.posicao.lon"], -43.2);
        assert_eq!(flat["linha"], "474");
        assert!(!flat.contains_key("veiculo"));
    }

    #[test]
    fn test_arrays_are_serialized() {
        let record = json!({"paradas": [1, 2, 3], "vazio": {}});
        let flat = flatten_record(0, &record).unwrap();

        assert_eq!(flat["paradas"], "[1,2,3]");
        assert_eq!(flat["vazio"], Value::Null);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            flatten_record(7, &json!([1, 2])),
            Err(ConvertError::NotAnObject { index: 7 })
        ));
        assert!(flatten_record(0, &json!("texto")).is_err());
    }
}

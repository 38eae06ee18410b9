use crate::{Codec, DecodeError, FieldKey, Value};
use reproto_core::{DeclId, DeclKind, EnumType, EnumValue, Field, Primitive, SubTypeStrategy, TypeRef};
use serde_json::{Map, Number, Value as Json};

impl Codec<'_> {
    /// Decode `json` as an instance of the declaration `decl`.
    pub fn decode(&self, decl: DeclId, json: &Json) -> Result<Value, DecodeError> {
        self.decl(decl, json, "$")
    }

    /// Decode `json` as a value of `ty`.
    pub fn decode_type(&self, ty: &TypeRef, json: &Json) -> Result<Value, DecodeError> {
        self.ty(ty, json, "$")
    }

    fn ty(&self, ty: &TypeRef, json: &Json, path: &str) -> Result<Value, DecodeError> {
        match ty {
            TypeRef::Primitive(primitive) => decode_primitive(*primitive, json, path),
            TypeRef::Decl(id) => self.decl(*id, json, path),
            TypeRef::Array(inner) => {
                let items = expect_array(json, path)?;
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    values.push(self.ty(inner, item, &format!("{}[{}]", path, index))?);
                }
                Ok(Value::Array(values))
            }
            TypeRef::Map(key, inner) => {
                let object = expect_object(json, path)?;
                let mut entries = Vec::with_capacity(object.len());
                for (name, item) in object {
                    let item_path = format!("{}.{}", path, name);
                    entries.push((
                        decode_key(key, name, &item_path)?,
                        self.ty(inner, item, &item_path)?,
                    ));
                }
                Ok(Value::Map(entries))
            }
            TypeRef::Tuple(types) => {
                let items = expect_array(json, path)?;
                let mut values = Vec::with_capacity(types.len());
                for (index, ty) in types.iter().enumerate() {
                    let item = items.get(index).ok_or_else(|| DecodeError::MissingField {
                        path: path.to_string(),
                        field: FieldKey::Index(index),
                    })?;
                    values.push(self.ty(ty, item, &format!("{}[{}]", path, index))?);
                }
                Ok(Value::Tuple(values))
            }
        }
    }

    fn decl(&self, id: DeclId, json: &Json, path: &str) -> Result<Value, DecodeError> {
        let decl = self.schema.decl(id);
        match &decl.kind {
            DeclKind::Type(body) => {
                let object = expect_object(json, path)?;
                Ok(Value::Record {
                    decl: id,
                    sub_type: None,
                    fields: self.object_fields(body.fields.iter(), object, path)?,
                })
            }
            DeclKind::Tuple(body) => {
                let items = expect_array(json, path)?;
                let mut fields = Vec::with_capacity(body.fields.len());
                for (index, field) in body.fields.iter().enumerate() {
                    match items.get(index) {
                        Some(Json::Null) | None if field.optional => fields.push(None),
                        Some(item) => fields.push(Some(self.ty(
                            &field.ty,
                            item,
                            &format!("{}[{}]", path, index),
                        )?)),
                        None => {
                            return Err(DecodeError::MissingField {
                                path: path.to_string(),
                                field: FieldKey::Index(index),
                            });
                        }
                    }
                }
                Ok(Value::Record {
                    decl: id,
                    sub_type: None,
                    fields,
                })
            }
            DeclKind::Interface(body) => {
                let object = expect_object(json, path)?;
                let index = match &body.strategy {
                    SubTypeStrategy::Tagged { tag } => {
                        let literal = match object.get(tag) {
                            None | Some(Json::Null) => {
                                return Err(DecodeError::MissingField {
                                    path: path.to_string(),
                                    field: FieldKey::Name(tag.clone()),
                                });
                            }
                            Some(Json::String(literal)) => literal,
                            Some(other) => {
                                return Err(DecodeError::UnexpectedType {
                                    path: format!("{}.{}", path, tag),
                                    expected: "string",
                                    found: kind(other),
                                });
                            }
                        };
                        body.sub_types
                            .iter()
                            .position(|s| s.literal == *literal)
                            .ok_or_else(|| DecodeError::UnknownVariant {
                                path: path.to_string(),
                                value: format!("{:?}", literal),
                            })?
                    }
                    SubTypeStrategy::Untagged => body
                        .sub_types
                        .iter()
                        .position(|s| {
                            body.fields_of(s)
                                .filter(|f| f.is_required())
                                .all(|f| is_present(object, &f.json_name))
                        })
                        .ok_or_else(|| DecodeError::NoMatchingSubType {
                            path: path.to_string(),
                            decl: self.describe(id),
                        })?,
                };
                let sub_type = &body.sub_types[index];
                Ok(Value::Record {
                    decl: id,
                    sub_type: Some(index),
                    fields: self.object_fields(body.fields_of(sub_type), object, path)?,
                })
            }
            DeclKind::Enum(body) => {
                let (expected, matches_kind) = match body.ty {
                    EnumType::String => ("string", json.is_string()),
                    _ => ("integer", json.is_number()),
                };
                if !matches_kind {
                    return Err(DecodeError::UnexpectedType {
                        path: path.to_string(),
                        expected,
                        found: kind(json),
                    });
                }
                body.members
                    .iter()
                    .position(|m| enum_matches(&m.value, json))
                    .map(|member| Value::Enum { decl: id, member })
                    .ok_or_else(|| DecodeError::NoMatchingValue {
                        path: path.to_string(),
                        decl: self.describe(id),
                        value: json.to_string(),
                    })
            }
            DeclKind::Service(_) => Err(DecodeError::NotData {
                path: path.to_string(),
                decl: self.describe(id),
                kind: decl.kind_name(),
            }),
        }
    }

    fn object_fields<'f>(
        &self,
        fields: impl Iterator<Item = &'f Field>,
        object: &Map<String, Json>,
        path: &str,
    ) -> Result<Vec<Option<Value>>, DecodeError> {
        let mut values = Vec::new();
        for field in fields {
            match object.get(&field.json_name) {
                None | Some(Json::Null) if field.optional => values.push(None),
                None | Some(Json::Null) => {
                    return Err(DecodeError::MissingField {
                        path: path.to_string(),
                        field: FieldKey::Name(field.json_name.clone()),
                    });
                }
                Some(item) => {
                    let item_path = format!("{}.{}", path, field.json_name);
                    values.push(Some(self.ty(&field.ty, item, &item_path)?));
                }
            }
        }
        Ok(values)
    }
}

fn kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn is_present(object: &Map<String, Json>, key: &str) -> bool {
    !matches!(object.get(key), None | Some(Json::Null))
}

fn expect_array<'j>(json: &'j Json, path: &str) -> Result<&'j Vec<Json>, DecodeError> {
    json.as_array().ok_or_else(|| DecodeError::UnexpectedType {
        path: path.to_string(),
        expected: "array",
        found: kind(json),
    })
}

fn expect_object<'j>(json: &'j Json, path: &str) -> Result<&'j Map<String, Json>, DecodeError> {
    json.as_object().ok_or_else(|| DecodeError::UnexpectedType {
        path: path.to_string(),
        expected: "object",
        found: kind(json),
    })
}

fn as_integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn integer_range(primitive: Primitive) -> (i128, i128) {
    match primitive {
        Primitive::U32 => (0, u32::MAX as i128),
        Primitive::U64 => (0, u64::MAX as i128),
        Primitive::I32 => (i32::MIN as i128, i32::MAX as i128),
        _ => (i64::MIN as i128, i64::MAX as i128),
    }
}

fn checked_integer(primitive: Primitive, value: i128, path: &str) -> Result<Value, DecodeError> {
    let (min, max) = integer_range(primitive);
    if value < min || value > max {
        return Err(DecodeError::OutOfRange {
            path: path.to_string(),
            value: value.to_string(),
            ty: primitive.name(),
        });
    }
    Ok(Value::Integer(value))
}

fn decode_primitive(primitive: Primitive, json: &Json, path: &str) -> Result<Value, DecodeError> {
    let unexpected = |expected| DecodeError::UnexpectedType {
        path: path.to_string(),
        expected,
        found: kind(json),
    };
    match primitive {
        Primitive::Any => Ok(Value::Any(json.clone())),
        Primitive::Boolean => json.as_bool().map(Value::Boolean).ok_or_else(|| unexpected("boolean")),
        Primitive::String | Primitive::DateTime | Primitive::Bytes => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| unexpected("string")),
        Primitive::Float | Primitive::Double => {
            json.as_f64().map(Value::Float).ok_or_else(|| unexpected("number"))
        }
        integer => {
            let value = match json {
                Json::Number(number) => as_integer(number),
                _ => None,
            }
            .ok_or_else(|| unexpected("integer"))?;
            checked_integer(integer, value, path)
        }
    }
}

/// Map keys are always strings in JSON; integer key types parse the string.
fn decode_key(ty: &TypeRef, key: &str, path: &str) -> Result<Value, DecodeError> {
    match ty {
        TypeRef::Primitive(primitive) if primitive.is_integer() => {
            let value = key.parse::<i128>().map_err(|_| DecodeError::UnexpectedType {
                path: path.to_string(),
                expected: "integer key",
                found: "string",
            })?;
            checked_integer(*primitive, value, path)
        }
        _ => Ok(Value::String(key.to_string())),
    }
}

fn enum_matches(value: &EnumValue, json: &Json) -> bool {
    match (value, json) {
        (EnumValue::String(value), Json::String(json)) => value == json,
        (EnumValue::Number(value), Json::Number(json)) => as_integer(json) == Some(*value),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_bounds() {
        assert_eq!(
            decode_primitive(Primitive::U32, &json!(4294967295u64), "$"),
            Ok(Value::Integer(4294967295))
        );
        assert!(matches!(
            decode_primitive(Primitive::U32, &json!(-1), "$"),
            Err(DecodeError::OutOfRange { ty: "u32", .. })
        ));
        assert!(matches!(
            decode_primitive(Primitive::I32, &json!(1.5), "$"),
            Err(DecodeError::UnexpectedType { expected: "integer", found: "number", .. })
        ));
    }

    #[test]
    fn test_integer_keys() {
        assert_eq!(
            decode_key(&TypeRef::Primitive(Primitive::I64), "-7", "$"),
            Ok(Value::Integer(-7))
        );
        assert!(decode_key(&TypeRef::Primitive(Primitive::U64), "seven", "$").is_err());
        assert_eq!(
            decode_key(&TypeRef::Primitive(Primitive::String), "7", "$"),
            Ok(Value::String("7".to_string()))
        );
    }
}

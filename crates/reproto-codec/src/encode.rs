use crate::{Codec, EncodeError, Value};
use reproto_core::{DeclId, DeclKind, DiscriminatorPlacement, EnumValue, Field, SubTypeStrategy};
use serde_json::{Map, Number, Value as Json};

impl Codec<'_> {
    /// Encode a decoded value back into JSON.
    ///
    /// Object keys follow field declaration order; the discriminator of a
    /// tagged interface goes first or last as configured.
    pub fn encode(&self, value: &Value) -> Result<Json, EncodeError> {
        self.value(value, "$")
    }

    fn value(&self, value: &Value, path: &str) -> Result<Json, EncodeError> {
        Ok(match value {
            Value::Boolean(value) => Json::Bool(*value),
            Value::String(value) => Json::String(value.clone()),
            Value::Integer(value) => encode_integer(*value, path)?,
            Value::Float(value) => Number::from_f64(*value)
                .map(Json::Number)
                .ok_or_else(|| invalid(path, format!("{} is not a finite number", value)))?,
            Value::Any(value) => value.clone(),
            Value::Array(items) | Value::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    values.push(self.value(item, &format!("{}[{}]", path, index))?);
                }
                Json::Array(values)
            }
            Value::Map(entries) => {
                let mut object = Map::new();
                for (key, item) in entries {
                    let key = match key {
                        Value::String(key) => key.clone(),
                        Value::Integer(key) => key.to_string(),
                        _ => return Err(invalid(path, "map keys must be strings or integers")),
                    };
                    let item = self.value(item, &format!("{}.{}", path, key))?;
                    object.insert(key, item);
                }
                Json::Object(object)
            }
            Value::Record {
                decl,
                sub_type,
                fields,
            } => self.record(*decl, *sub_type, fields, path)?,
            Value::Enum { decl, member } => {
                let DeclKind::Enum(body) = &self.schema.decl(*decl).kind else {
                    return Err(invalid(path, format!("`{}` is not an enum", self.describe(*decl))));
                };
                let member = body.members.get(*member).ok_or_else(|| {
                    invalid(path, format!("`{}` has no member #{}", self.describe(*decl), member))
                })?;
                match &member.value {
                    EnumValue::String(value) => Json::String(value.clone()),
                    EnumValue::Number(value) => encode_integer(*value, path)?,
                }
            }
        })
    }

    fn record(
        &self,
        id: DeclId,
        sub_type: Option<usize>,
        values: &[Option<Value>],
        path: &str,
    ) -> Result<Json, EncodeError> {
        match (&self.schema.decl(id).kind, sub_type) {
            (DeclKind::Type(body), None) => {
                let mut object = Map::new();
                self.write_fields(&mut object, body.fields.iter(), values, path)?;
                Ok(Json::Object(object))
            }
            (DeclKind::Tuple(body), None) => {
                check_arity(body.fields.len(), values.len(), path)?;
                let mut items = Vec::with_capacity(values.len());
                for (index, (field, value)) in body.fields.iter().zip(values).enumerate() {
                    items.push(match value {
                        Some(value) => self.value(value, &format!("{}[{}]", path, index))?,
                        None if field.optional => Json::Null,
                        None => return Err(missing(path, field)),
                    });
                }
                Ok(Json::Array(items))
            }
            (DeclKind::Interface(body), Some(index)) => {
                let sub_type = body.sub_types.get(index).ok_or_else(|| {
                    invalid(path, format!("`{}` has no sub-type #{}", self.describe(id), index))
                })?;
                let tag = match &body.strategy {
                    SubTypeStrategy::Tagged { tag } => Some(tag),
                    SubTypeStrategy::Untagged => None,
                };
                let placement = self.options.discriminator_placement;

                let mut object = Map::new();
                if let Some(tag) = tag
                    && placement == DiscriminatorPlacement::First
                {
                    object.insert(tag.clone(), Json::String(sub_type.literal.clone()));
                }
                self.write_fields(&mut object, body.fields_of(sub_type), values, path)?;
                if let Some(tag) = tag
                    && placement == DiscriminatorPlacement::Last
                {
                    object.insert(tag.clone(), Json::String(sub_type.literal.clone()));
                }
                Ok(Json::Object(object))
            }
            _ => Err(invalid(
                path,
                format!("value does not have the shape of `{}`", self.describe(id)),
            )),
        }
    }

    fn write_fields<'f>(
        &self,
        object: &mut Map<String, Json>,
        fields: impl Iterator<Item = &'f Field>,
        values: &[Option<Value>],
        path: &str,
    ) -> Result<(), EncodeError> {
        let fields: Vec<&Field> = fields.collect();
        check_arity(fields.len(), values.len(), path)?;
        for (field, value) in fields.into_iter().zip(values) {
            match value {
                Some(value) => {
                    let item = self.value(value, &format!("{}.{}", path, field.json_name))?;
                    object.insert(field.json_name.clone(), item);
                }
                None if field.optional => {}
                None => return Err(missing(path, field)),
            }
        }
        Ok(())
    }
}

fn encode_integer(value: i128, path: &str) -> Result<Json, EncodeError> {
    if let Ok(value) = i64::try_from(value) {
        Ok(Json::from(value))
    } else if let Ok(value) = u64::try_from(value) {
        Ok(Json::from(value))
    } else {
        Err(invalid(path, format!("{} does not fit in 64 bits", value)))
    }
}

fn check_arity(expected: usize, found: usize, path: &str) -> Result<(), EncodeError> {
    if expected == found {
        return Ok(());
    }
    Err(invalid(
        path,
        format!("expected {} fields, found {}", expected, found),
    ))
}

fn missing(path: &str, field: &Field) -> EncodeError {
    EncodeError::MissingField {
        path: path.to_string(),
        field: field.name.clone(),
    }
}

fn invalid(path: &str, message: impl Into<String>) -> EncodeError {
    EncodeError::Invalid {
        path: path.to_string(),
        message: message.into(),
    }
}

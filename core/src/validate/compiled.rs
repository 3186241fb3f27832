use crate::error::SchemaError;
use crate::schema::{DType, Parameter};
use crate::validate::value::ParamValue;

/// A schema entry with its dtype parsed and its choice set converted, built
/// once when the cab is compiled and reused for every validation pass.
#[derive(Debug, Clone)]
pub struct CompiledParam {
    pub decl: Parameter,
    pub dtype: DType,
    /// Allowed values, already coerced to the declared dtype. Empty means
    /// unrestricted.
    pub choices: Vec<ParamValue>,
}

impl CompiledParam {
    pub fn compile(name: &str, decl: Parameter) -> Result<Self, SchemaError> {
        let dtype = DType::parse(&decl.dtype).ok_or_else(|| SchemaError::BadDType {
            name: name.to_string(),
            dtype: decl.dtype.clone(),
        })?;
        let choices = decl
            .choices
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|raw| {
                let value = ParamValue::from_json(raw);
                coerce_value(&value, &dtype).unwrap_or(value)
            })
            .collect();
        Ok(Self {
            decl,
            dtype,
            choices,
        })
    }

    pub fn required(&self) -> bool {
        self.decl.required
    }
}

/// Coerce a value to a declared dtype, or explain why it cannot be. The
/// file-ish dtypes accept anything string-like here; path existence and
/// kind are the validator's separate concern.
pub fn coerce_value(value: &ParamValue, dtype: &DType) -> Result<ParamValue, String> {
    match dtype {
        DType::Str | DType::File | DType::Directory | DType::MS => match value {
            ParamValue::Str(_) => Ok(value.clone()),
            ParamValue::Bool(_) | ParamValue::Int(_) | ParamValue::Float(_) => {
                Ok(ParamValue::Str(value.render()))
            }
            other => Err(format!("expected {dtype}, got {}", other.type_name())),
        },
        DType::Int => match value {
            ParamValue::Int(_) => Ok(value.clone()),
            ParamValue::Bool(b) => Ok(ParamValue::Int(i64::from(*b))),
            ParamValue::Float(f) if f.fract() == 0.0 => Ok(ParamValue::Int(*f as i64)),
            ParamValue::Float(f) => Err(format!("'{f}' is not a valid int")),
            ParamValue::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|_| format!("'{s}' is not a valid int")),
            other => Err(format!("expected int, got {}", other.type_name())),
        },
        DType::Float => match value {
            ParamValue::Float(_) => Ok(value.clone()),
            ParamValue::Int(i) => Ok(ParamValue::Float(*i as f64)),
            ParamValue::Bool(b) => Ok(ParamValue::Float(f64::from(u8::from(*b)))),
            ParamValue::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| format!("'{s}' is not a valid float")),
            other => Err(format!("expected float, got {}", other.type_name())),
        },
        DType::Bool => match value {
            ParamValue::Bool(_) => Ok(value.clone()),
            ParamValue::Int(0) => Ok(ParamValue::Bool(false)),
            ParamValue::Int(1) => Ok(ParamValue::Bool(true)),
            ParamValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(ParamValue::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(ParamValue::Bool(false)),
                _ => Err(format!("'{s}' is not a valid bool")),
            },
            other => Err(format!("expected bool, got {}", other.type_name())),
        },
        DType::List(elem) => match value {
            ParamValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let coerced = coerce_value(item, elem)
                        .map_err(|reason| format!("element {index}: {reason}"))?;
                    out.push(coerced);
                }
                Ok(ParamValue::List(out))
            }
            other => Err(format!("expected {dtype}, got {}", other.type_name())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strings_coerce_to_numeric_dtypes() {
        assert_eq!(
            coerce_value(&"3".into(), &DType::Int),
            Ok(ParamValue::Int(3))
        );
        assert_eq!(
            coerce_value(&" 2.5 ".into(), &DType::Float),
            Ok(ParamValue::Float(2.5))
        );
        assert_eq!(
            coerce_value(&"yes".into(), &DType::Bool),
            Ok(ParamValue::Bool(true))
        );
    }

    #[test]
    fn bad_scalars_explain_themselves() {
        let err = coerce_value(&"many".into(), &DType::Int).unwrap_err();
        assert_eq!(err, "'many' is not a valid int");
        let err = coerce_value(&ParamValue::Float(3.5), &DType::Int).unwrap_err();
        assert_eq!(err, "'3.5' is not a valid int");
    }

    #[test]
    fn lists_coerce_per_element_and_name_the_offender() {
        let dtype = DType::parse("List[int]").unwrap();
        let good = ParamValue::List(vec!["1".into(), 2.into()]);
        assert_eq!(
            coerce_value(&good, &dtype),
            Ok(ParamValue::List(vec![1.into(), 2.into()]))
        );

        let bad = ParamValue::List(vec![1.into(), "x".into()]);
        let err = coerce_value(&bad, &dtype).unwrap_err();
        assert_eq!(err, "element 1: 'x' is not a valid int");
    }

    #[test]
    fn scalars_do_not_pass_as_lists() {
        let dtype = DType::parse("List[str]").unwrap();
        let err = coerce_value(&"lone".into(), &dtype).unwrap_err();
        assert_eq!(err, "expected List[str], got str");
    }

    #[test]
    fn compile_rejects_unknown_dtypes() {
        let decl = Parameter {
            dtype: "Filz".into(),
            ..Default::default()
        };
        let err = CompiledParam::compile("image", decl).unwrap_err();
        assert!(matches!(err, SchemaError::BadDType { .. }), "{err:?}");
    }

    #[test]
    fn compile_coerces_choices_to_the_dtype() {
        let decl = Parameter {
            dtype: "int".into(),
            choices: Some(vec![
                serde_json::json!(1),
                serde_json::json!("2"),
            ]),
            ..Default::default()
        };
        let compiled = CompiledParam::compile("n", decl).unwrap();
        assert_eq!(compiled.choices, vec![ParamValue::Int(1), ParamValue::Int(2)]);
    }
}

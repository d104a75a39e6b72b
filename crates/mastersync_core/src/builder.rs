//! Record builder: generic records to typed entities.

use crate::catalog::DYNAMIC_FIELD;
use crate::entity::{DynamicFieldRecord, Entity, EntityKey, FieldValue, EMPTY_VALUE_JSON};
use crate::error::{BuildError, BuildResult};
use crate::shape::{FieldSpec, FieldType, Shape};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mastersync_codec::GenericRecord;
use serde_json::Value;
use std::collections::BTreeMap;

const LOCAL_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const FOUND_PREVIEW_LEN: usize = 32;

/// Builds typed entities from decoded records.
///
/// Stateless: every method is an associated function and safe to call from
/// any number of tasks at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordBuilder;

impl RecordBuilder {
    /// Builds one entity of `shape` from a generic record.
    ///
    /// Declared fields are copied and coerced; fields the shape does not
    /// declare are ignored.
    ///
    /// # Errors
    ///
    /// - [`BuildError::MissingField`] if a required or key field is absent or null
    /// - [`BuildError::TypeMismatch`] if a value cannot be coerced
    pub fn build(record: &GenericRecord, shape: &Shape) -> BuildResult<Entity> {
        let mut fields = BTreeMap::new();
        for spec in shape.fields {
            fields.insert(spec.name.to_string(), field_value(shape.name, spec, record)?);
        }

        let mut parts = Vec::with_capacity(shape.primary_key.len());
        for key_field in shape.primary_key {
            match fields.get(*key_field) {
                Some(value) if !value.is_null() => parts.push(value.key_part()),
                _ => return Err(BuildError::missing_field(shape.name, key_field)),
            }
        }

        Ok(Entity {
            shape: shape.name.to_string(),
            key: EntityKey(parts),
            fields,
        })
    }

    /// Builds every record, stopping at the first failure.
    pub fn build_all(records: &[GenericRecord], shape: &Shape) -> BuildResult<Vec<Entity>> {
        records
            .iter()
            .map(|record| Self::build(record, shape))
            .collect()
    }

    /// Builds a dynamic field record.
    ///
    /// The active flag is read from `isActive`, or `active` for older
    /// payloads, and defaults to inactive. `fieldVal` is kept as a
    /// serialized fragment and defaults to `"[]"`.
    pub fn build_dynamic(record: &GenericRecord) -> BuildResult<DynamicFieldRecord> {
        let shape = DYNAMIC_FIELD.name;
        let text = |name: &'static str, required: bool| -> BuildResult<Option<String>> {
            let spec = FieldSpec {
                name,
                ty: FieldType::Text,
                required,
            };
            match field_value(shape, &spec, record)? {
                FieldValue::Text(s) => Ok(Some(s)),
                _ => Ok(None),
            }
        };

        let id = text("id", true)?.ok_or_else(|| BuildError::missing_field(shape, "id"))?;
        let data_type = text("dataType", false)?;
        let name = text("name", false)?;
        let lang_code = text("langCode", false)?;

        let value_json = match record.get("fieldVal") {
            None | Some(Value::Null) => EMPTY_VALUE_JSON.to_string(),
            Some(value) => json_fragment(value),
        };

        let active_key = if record.contains_key("isActive") {
            "isActive"
        } else {
            "active"
        };
        let active_spec = FieldSpec::optional(active_key, FieldType::Boolean);
        let active = matches!(
            field_value(shape, &active_spec, record)?,
            FieldValue::Boolean(true)
        );

        Ok(DynamicFieldRecord {
            id,
            data_type,
            name,
            lang_code,
            value_json,
            active,
        })
    }
}

fn field_value(shape: &str, spec: &FieldSpec, record: &GenericRecord) -> BuildResult<FieldValue> {
    match record.get(spec.name) {
        None | Some(Value::Null) if spec.required => {
            Err(BuildError::missing_field(shape, spec.name))
        }
        None | Some(Value::Null) => Ok(FieldValue::Null),
        Some(value) => coerce(value, spec.ty)
            .ok_or_else(|| BuildError::type_mismatch(shape, spec.name, spec.ty, preview(value))),
    }
}

fn coerce(value: &Value, ty: FieldType) -> Option<FieldValue> {
    match ty {
        FieldType::Text => match value {
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Number(n) => Some(FieldValue::Text(n.to_string())),
            Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
            _ => None,
        },
        FieldType::Integer => match value {
            Value::Number(n) => n.as_i64().or_else(|| integral(n.as_f64()?)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .map(FieldValue::Integer),
        FieldType::Decimal => match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|d| d.is_finite()),
            _ => None,
        }
        .map(FieldValue::Decimal),
        FieldType::Boolean => match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
        .map(FieldValue::Boolean),
        FieldType::Timestamp => match value {
            Value::String(s) => parse_timestamp(s.trim()),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.naive_utc()),
            _ => None,
        }
        .map(FieldValue::Timestamp),
        FieldType::Json => Some(FieldValue::Json(json_fragment(value))),
    }
}

// 2^63 exactly; `i64::MAX as f64` rounds up to it.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < I64_UPPER_BOUND {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in LOCAL_DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// A string that already parses as JSON is kept as is; anything else is serialized.
fn json_fragment(value: &Value) -> String {
    match value {
        Value::String(s) if serde_json::from_str::<Value>(s).is_ok() => s.clone(),
        other => other.to_string(),
    }
}

fn preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= FOUND_PREVIEW_LEN {
        rendered
    } else {
        let mut short: String = rendered.chars().take(FOUND_PREVIEW_LEN).collect();
        short.push_str("...");
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LOCATION, MACHINE_MASTER, REGISTRATION_CENTER};
    use crate::shape::FieldSpec;
    use chrono::{NaiveDate, Timelike};
    use proptest::prelude::*;
    use serde_json::json;

    fn record(value: Value) -> GenericRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    static SAMPLE: Shape = Shape {
        name: "Sample",
        fields: &[
            FieldSpec::required("id", FieldType::Text),
            FieldSpec::optional("count", FieldType::Integer),
            FieldSpec::optional("ratio", FieldType::Decimal),
            FieldSpec::optional("enabled", FieldType::Boolean),
            FieldSpec::optional("at", FieldType::Timestamp),
            FieldSpec::optional("blob", FieldType::Json),
        ],
        primary_key: &["id"],
    };

    #[test]
    fn builds_composite_key_in_key_order() {
        let entity = RecordBuilder::build(
            &record(json!({"langCode": "fra", "id": "10001", "name": "Centre", "extra": 1})),
            &REGISTRATION_CENTER,
        )
        .unwrap();

        assert_eq!(entity.key, EntityKey::new(["10001", "fra"]));
        assert_eq!(entity.shape, "RegistrationCenter");
        assert!(entity.get("extra").is_none());
        assert!(entity.get("contactPhone").unwrap().is_null());
    }

    #[test]
    fn missing_required_field() {
        let err = RecordBuilder::build(&record(json!({"id": "10001"})), &REGISTRATION_CENTER)
            .unwrap_err();
        assert_eq!(err, BuildError::missing_field("RegistrationCenter", "langCode"));

        let err = RecordBuilder::build(
            &record(json!({"id": null, "langCode": "eng"})),
            &REGISTRATION_CENTER,
        )
        .unwrap_err();
        assert_eq!(err, BuildError::missing_field("RegistrationCenter", "id"));
    }

    #[test]
    fn numeric_id_rendered_as_text() {
        let entity = RecordBuilder::build(&record(json!({"id": 42})), &MACHINE_MASTER).unwrap();
        assert_eq!(entity.key, EntityKey::new(["42"]));
        assert_eq!(entity.text("id"), Some("42"));
    }

    #[test]
    fn coerces_numbers_and_flags() {
        let entity = RecordBuilder::build(
            &record(json!({
                "id": "s",
                "count": "17",
                "ratio": 2,
                "enabled": "TRUE",
            })),
            &SAMPLE,
        )
        .unwrap();

        assert_eq!(entity.get("count"), Some(&FieldValue::Integer(17)));
        assert_eq!(entity.get("ratio"), Some(&FieldValue::Decimal(2.0)));
        assert_eq!(entity.get("enabled"), Some(&FieldValue::Boolean(true)));

        let entity =
            RecordBuilder::build(&record(json!({"id": "s", "count": 3.0})), &SAMPLE).unwrap();
        assert_eq!(entity.get("count"), Some(&FieldValue::Integer(3)));
    }

    #[test]
    fn type_mismatches() {
        let cases = [
            json!({"id": "s", "count": 1.5}),
            json!({"id": "s", "count": "many"}),
            json!({"id": "s", "enabled": "yes"}),
            json!({"id": "s", "ratio": [1]}),
            json!({"id": "s", "at": "yesterday"}),
            json!({"id": {"nested": true}}),
        ];
        for case in cases {
            let err = RecordBuilder::build(&record(case.clone()), &SAMPLE).unwrap_err();
            assert!(
                matches!(err, BuildError::TypeMismatch { .. }),
                "{case} gave {err:?}"
            );
        }
    }

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let inputs = [
            json!("2024-03-01T10:30:00Z"),
            json!("2024-03-01T12:30:00+02:00"),
            json!("2024-03-01T10:30:00"),
            json!("2024-03-01 10:30:00.000"),
            json!(expected.and_utc().timestamp_millis()),
        ];
        for input in inputs {
            let entity =
                RecordBuilder::build(&record(json!({"id": "s", "at": input})), &SAMPLE).unwrap();
            assert_eq!(entity.get("at"), Some(&FieldValue::Timestamp(expected)));
        }

        let entity =
            RecordBuilder::build(&record(json!({"id": "s", "at": "2024-03-01"})), &SAMPLE)
                .unwrap();
        match entity.get("at") {
            Some(FieldValue::Timestamp(ts)) => assert_eq!(ts.hour(), 0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn json_is_opaque() {
        let entity = RecordBuilder::build(
            &record(json!({"id": "s", "blob": {"b": [1, 2]}})),
            &SAMPLE,
        )
        .unwrap();
        assert_eq!(
            entity.get("blob"),
            Some(&FieldValue::Json(r#"{"b":[1,2]}"#.to_string()))
        );
    }

    #[test]
    fn integer_key_field() {
        let entity = RecordBuilder::build(
            &record(json!({"code": "KTA", "langCode": "eng", "hierarchyLevel": "3"})),
            &LOCATION,
        )
        .unwrap();
        assert_eq!(entity.get("hierarchyLevel"), Some(&FieldValue::Integer(3)));
    }

    #[test]
    fn build_all_stops_at_first_failure() {
        let records = vec![
            record(json!({"id": "1"})),
            record(json!({"name": "no id"})),
            record(json!({"id": "3"})),
        ];
        let err = RecordBuilder::build_all(&records, &MACHINE_MASTER).unwrap_err();
        assert_eq!(err, BuildError::missing_field("MachineMaster", "id"));
    }

    #[test]
    fn dynamic_record_defaults() {
        let dynamic =
            RecordBuilder::build_dynamic(&record(json!({"id": "d1", "name": "religion"})))
                .unwrap();
        assert_eq!(dynamic.value_json, "[]");
        assert!(!dynamic.active);
        assert_eq!(dynamic.name.as_deref(), Some("religion"));

        let dynamic =
            RecordBuilder::build_dynamic(&record(json!({"id": "d1", "fieldVal": null}))).unwrap();
        assert_eq!(dynamic.value_json, "[]");
    }

    #[test]
    fn dynamic_record_active_aliases() {
        let a = RecordBuilder::build_dynamic(&record(json!({"id": "d1", "isActive": true})))
            .unwrap();
        let b = RecordBuilder::build_dynamic(&record(json!({"id": "d1", "active": "true"})))
            .unwrap();
        assert!(a.active);
        assert!(b.active);
    }

    #[test]
    fn dynamic_record_keeps_field_values() {
        let dynamic = RecordBuilder::build_dynamic(&record(json!({
            "id": "d2",
            "dataType": "string",
            "langCode": "eng",
            "fieldVal": [{"code": "MLE", "value": "Male"}],
        })))
        .unwrap();
        assert_eq!(dynamic.value().unwrap()[0]["value"], "Male");
    }

    #[test]
    fn dynamic_record_plain_text_value_is_serialized() {
        let dynamic = RecordBuilder::build_dynamic(&record(json!({
            "id": "df-1",
            "name": "religion",
            "fieldVal": "Hindu",
        })))
        .unwrap();
        assert_eq!(dynamic.value_json, r#""Hindu""#);
        assert_eq!(dynamic.value().unwrap(), json!("Hindu"));

        let dynamic = RecordBuilder::build_dynamic(&record(json!({
            "id": "df-2",
            "fieldVal": r#"[{"code":"HND"}]"#,
        })))
        .unwrap();
        assert_eq!(dynamic.value_json, r#"[{"code":"HND"}]"#);
        assert_eq!(dynamic.value().unwrap()[0]["code"], "HND");
    }

    #[test]
    fn integer_beyond_i64_is_rejected() {
        let err = RecordBuilder::build(
            &record(json!({"id": "big", "count": 9_223_372_036_854_775_808u64})),
            &SAMPLE,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { .. }));

        let entity = RecordBuilder::build(
            &record(json!({"id": "max", "count": i64::MAX})),
            &SAMPLE,
        )
        .unwrap();
        assert_eq!(entity.get("count"), Some(&FieldValue::Integer(i64::MAX)));

        let entity = RecordBuilder::build(
            &record(json!({"id": "float", "count": 4_611_686_018_427_387_904.0})),
            &SAMPLE,
        )
        .unwrap();
        assert_eq!(
            entity.get("count"),
            Some(&FieldValue::Integer(4_611_686_018_427_387_904))
        );
    }

    #[test]
    fn dynamic_record_requires_id() {
        let err = RecordBuilder::build_dynamic(&record(json!({"name": "gender"}))).unwrap_err();
        assert_eq!(err, BuildError::missing_field("DynamicField", "id"));
    }

    proptest! {
        #[test]
        fn integer_strings_coerce(n in any::<i64>()) {
            let entity = RecordBuilder::build(
                &record(json!({"id": "p", "count": n.to_string()})),
                &SAMPLE,
            ).unwrap();
            prop_assert_eq!(entity.get("count"), Some(&FieldValue::Integer(n)));
        }
    }
}

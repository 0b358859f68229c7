//! Field resolver: backend attribute metadata -> normalized Field, then user customization on top.

use crate::backend::AttributeMeta;
use crate::case::humanize;
use crate::config::{FieldConfig, SelectOption};
use crate::field::{Field, FieldData, FieldType, HtmlType, NamingPolicy, SelectData};

/// Native types whose values have no meaningful ordering or equality filter.
const UNFILTERABLE_NATIVE: &[&str] = &["map", "keyword", "tuple", "struct", "union", "term"];

/// Backend-native type name -> semantic type. Unknown names pass through.
pub fn normalize_type(native: &str) -> FieldType {
    match native {
        "string" | "atom" | "enum" | "ci_string" => FieldType::String,
        "uuid" | "binary_id" => FieldType::BinaryId,
        "id" | "integer" => FieldType::Integer,
        "float" => FieldType::Float,
        "decimal" => FieldType::Decimal,
        "boolean" => FieldType::Boolean,
        "date" => FieldType::Date,
        "time" | "time_usec" => FieldType::Time,
        "naive_datetime" | "naive_datetime_usec" => FieldType::NaiveDatetime,
        "utc_datetime" | "utc_datetime_usec" | "datetime" => FieldType::UtcDatetime,
        "binary" | "tuple" | "union" | "term" => FieldType::Binary,
        "map" | "keyword" | "struct" => FieldType::Map,
        other => FieldType::Other(other.to_string()),
    }
}

pub fn html_type_for(field_type: &FieldType) -> HtmlType {
    match field_type {
        FieldType::String | FieldType::BinaryId => HtmlType::Text,
        FieldType::Integer | FieldType::Float | FieldType::Decimal => HtmlType::Number,
        FieldType::Boolean => HtmlType::Checkbox,
        FieldType::Date => HtmlType::Date,
        FieldType::Time => HtmlType::Time,
        FieldType::NaiveDatetime | FieldType::UtcDatetime => HtmlType::DatetimeLocal,
        FieldType::Binary | FieldType::Map => HtmlType::Textarea,
        FieldType::ManyToOne => HtmlType::Select,
        _ => HtmlType::Unimplemented,
    }
}

pub fn default_length(field_type: &FieldType) -> u32 {
    match field_type {
        FieldType::String | FieldType::Binary => 255,
        FieldType::BinaryId => 36,
        FieldType::Integer => 10,
        FieldType::Float | FieldType::Decimal => 12,
        FieldType::Boolean => 5,
        FieldType::Date | FieldType::Time => 10,
        FieldType::NaiveDatetime | FieldType::UtcDatetime => 20,
        _ => 0,
    }
}

/// `(precision, scale)` for the type.
pub fn numeric_constraints(field_type: &FieldType) -> (u32, u32) {
    if field_type.is_numeric() {
        (10, 2)
    } else {
        (0, 0)
    }
}

pub fn is_filterable(native: &str) -> bool {
    !UNFILTERABLE_NATIVE.contains(&native)
}

/// Resolve one discovered attribute, then merge the user's declaration (if any) on top.
pub fn resolve_field(attr: &AttributeMeta, custom: Option<&FieldConfig>, policy: &NamingPolicy) -> Field {
    let field_type = normalize_type(&attr.native_type);
    let one_of = attr
        .one_of
        .as_ref()
        .filter(|values| !values.is_empty() && field_type == FieldType::String);

    let (html_type, length, data) = match one_of {
        Some(values) => (
            HtmlType::Select,
            values.iter().map(|v| v.chars().count() as u32).max().unwrap_or(0),
            FieldData::Select(SelectData {
                opts: values.iter().map(|v| (v.clone(), humanize(v))).collect(),
                multiple: false,
            }),
        ),
        None => (html_type_for(&field_type), default_length(&field_type), FieldData::None),
    };

    let mut field = base_field(&attr.name, field_type, html_type, length, policy);
    field.required = !attr.allow_nil && !attr.primary_key;
    field.filterable = is_filterable(&attr.native_type);
    field.data = data;

    if let Some(custom) = custom {
        apply_customization(&mut field, custom);
    }
    field
}

/// A field the user declared that the backend does not expose.
pub fn declared_field(custom: &FieldConfig, policy: &NamingPolicy) -> Field {
    let field_type = custom.field_type.clone().unwrap_or(FieldType::Undefined);
    let html_type = html_type_for(&field_type);
    let length = default_length(&field_type);
    let mut field = base_field(&custom.name, field_type, html_type, length, policy);
    apply_customization(&mut field, custom);
    field
}

/// Field skeleton with label, constraints and convention flags derived from key and type.
pub(crate) fn base_field(
    key: &str,
    field_type: FieldType,
    html_type: HtmlType,
    length: u32,
    policy: &NamingPolicy,
) -> Field {
    let label = humanize(key);
    let (precision, scale) = numeric_constraints(&field_type);
    Field {
        key: key.to_string(),
        field_type,
        html_type,
        placeholder: label.clone(),
        label,
        length,
        precision,
        scale,
        required: false,
        readonly: false,
        disabled: policy.is_disabled(key),
        hidden: policy.is_hidden(key),
        omitted: policy.is_omitted(key),
        filterable: true,
        renderer: None,
        data: FieldData::None,
    }
}

/// Shallow merge: every value the user set wins; unset values keep the derived default.
pub fn apply_customization(field: &mut Field, custom: &FieldConfig) {
    if let Some(v) = &custom.field_type {
        field.field_type = v.clone();
    }
    if let Some(v) = custom.html_type {
        field.html_type = v;
    }
    if let Some(v) = &custom.label {
        field.label = v.clone();
        if custom.placeholder.is_none() {
            field.placeholder = v.clone();
        }
    }
    if let Some(v) = &custom.placeholder {
        field.placeholder = v.clone();
    }
    if let Some(v) = custom.length {
        field.length = v;
    }
    if let Some(v) = custom.precision {
        field.precision = v;
    }
    if let Some(v) = custom.scale {
        field.scale = v;
    }
    if let Some(v) = custom.required {
        field.required = v;
    }
    if let Some(v) = custom.readonly {
        field.readonly = v;
    }
    if let Some(v) = custom.disabled {
        field.disabled = v;
    }
    if let Some(v) = custom.hidden {
        field.hidden = v;
    }
    if let Some(v) = custom.omitted {
        field.omitted = v;
    }
    if let Some(v) = custom.filterable {
        field.filterable = v;
    }
    if let Some(v) = &custom.renderer {
        field.renderer = Some(v.clone());
    }
    if let Some(options) = &custom.options {
        field.data = FieldData::Select(SelectData {
            opts: options.iter().map(SelectOption::pair).collect(),
            multiple: custom.multiple.unwrap_or(false),
        });
        if custom.html_type.is_none() {
            field.html_type = HtmlType::Select;
        }
    } else if let (Some(multiple), FieldData::Select(select)) = (custom.multiple, &mut field.data) {
        select.multiple = multiple;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingPolicyConfig;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    type Defaults = (FieldType, HtmlType, u32, u32, u32, bool);

    #[rstest]
    #[case("string", (FieldType::String, HtmlType::Text, 255, 0, 0, true))]
    #[case("atom", (FieldType::String, HtmlType::Text, 255, 0, 0, true))]
    #[case("uuid", (FieldType::BinaryId, HtmlType::Text, 36, 0, 0, true))]
    #[case("binary_id", (FieldType::BinaryId, HtmlType::Text, 36, 0, 0, true))]
    #[case("integer", (FieldType::Integer, HtmlType::Number, 10, 10, 2, true))]
    #[case("float", (FieldType::Float, HtmlType::Number, 12, 10, 2, true))]
    #[case("decimal", (FieldType::Decimal, HtmlType::Number, 12, 10, 2, true))]
    #[case("boolean", (FieldType::Boolean, HtmlType::Checkbox, 5, 0, 0, true))]
    #[case("date", (FieldType::Date, HtmlType::Date, 10, 0, 0, true))]
    #[case("time", (FieldType::Time, HtmlType::Time, 10, 0, 0, true))]
    #[case("naive_datetime", (FieldType::NaiveDatetime, HtmlType::DatetimeLocal, 20, 0, 0, true))]
    #[case("utc_datetime_usec", (FieldType::UtcDatetime, HtmlType::DatetimeLocal, 20, 0, 0, true))]
    #[case("binary", (FieldType::Binary, HtmlType::Textarea, 255, 0, 0, true))]
    #[case("map", (FieldType::Map, HtmlType::Textarea, 0, 0, 0, false))]
    #[case("tuple", (FieldType::Binary, HtmlType::Textarea, 255, 0, 0, false))]
    #[case("struct", (FieldType::Map, HtmlType::Textarea, 0, 0, 0, false))]
    #[case("geo_point", (FieldType::Other("geo_point".into()), HtmlType::Unimplemented, 0, 0, 0, true))]
    fn defaults_per_native_type(#[case] native: &str, #[case] expected: Defaults) {
        let field = resolve_field(&AttributeMeta::new("value", native), None, &NamingPolicy::default());
        let actual = (
            field.field_type,
            field.html_type,
            field.length,
            field.precision,
            field.scale,
            field.filterable,
        );
        assert_eq!(actual, expected);
    }

    #[test]
    fn one_of_becomes_select_sized_by_longest_value() {
        let attr = AttributeMeta::new("status", "atom").one_of(["draft", "published", "archived"]);
        let field = resolve_field(&attr, None, &NamingPolicy::default());
        assert_eq!(field.html_type, HtmlType::Select);
        assert_eq!(field.length, 9);
        match field.data {
            FieldData::Select(select) => {
                assert_eq!(select.opts[1], ("published".to_string(), "Published".to_string()));
                assert!(!select.multiple);
            }
            other => panic!("expected select data, got {:?}", other),
        }
    }

    #[test]
    fn labels_derive_from_key() {
        let field = resolve_field(&AttributeMeta::new("unit_price", "decimal"), None, &NamingPolicy::default());
        assert_eq!(field.label, "Unit price");
        assert_eq!(field.placeholder, "Unit price");
    }

    #[test]
    fn user_values_win_and_unset_keep_defaults() {
        let custom = FieldConfig::new("reference").readonly(true).length(30);
        let field = resolve_field(
            &AttributeMeta::new("reference", "string"),
            Some(&custom),
            &NamingPolicy::default(),
        );
        assert!(field.readonly);
        assert_eq!(field.length, 30);
        assert_eq!(field.field_type, FieldType::String);
        assert_eq!(field.html_type, HtmlType::Text);
        assert!(!field.required);
    }

    #[test]
    fn explicit_required_is_not_reset() {
        let custom = FieldConfig::new("name").required(true);
        let field = resolve_field(&AttributeMeta::new("name", "string"), Some(&custom), &NamingPolicy::default());
        assert!(field.required);

        let custom = FieldConfig::new("code").required(false);
        let attr = AttributeMeta::new("code", "string").required();
        let field = resolve_field(&attr, Some(&custom), &NamingPolicy::default());
        assert!(!field.required);
    }

    #[test]
    fn policy_flags_can_be_overridden() {
        let policy = NamingPolicy::from_config(&NamingPolicyConfig {
            hidden: vec!["^id$".into()],
            ..Default::default()
        })
        .unwrap();
        let hidden = resolve_field(&AttributeMeta::new("id", "binary_id"), None, &policy);
        assert!(hidden.hidden);
        let custom = FieldConfig::new("id").hidden(false);
        let shown = resolve_field(&AttributeMeta::new("id", "binary_id"), Some(&custom), &policy);
        assert!(!shown.hidden);
    }

    #[test]
    fn declared_only_fields_are_undefined() {
        let field = declared_field(&FieldConfig::new("total"), &NamingPolicy::default());
        assert_eq!(field.field_type, FieldType::Undefined);
        assert_eq!(field.html_type, HtmlType::Unimplemented);

        let typed = declared_field(&FieldConfig::new("total").field_type(FieldType::Decimal), &NamingPolicy::default());
        assert_eq!(typed.html_type, HtmlType::Number);
        assert_eq!((typed.precision, typed.scale), (10, 2));
    }

    #[test]
    fn user_options_make_a_select() {
        let custom = FieldConfig::new("size").options([SelectOption::Value("S".into()), SelectOption::Labeled("L".into(), "Large".into())]);
        let field = resolve_field(&AttributeMeta::new("size", "string"), Some(&custom), &NamingPolicy::default());
        assert_eq!(field.html_type, HtmlType::Select);
        match field.data {
            FieldData::Select(select) => assert_eq!(
                select.opts,
                vec![("S".to_string(), "S".to_string()), ("L".to_string(), "Large".to_string())]
            ),
            other => panic!("expected select data, got {:?}", other),
        }
    }
}

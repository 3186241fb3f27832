mod common;

use common::{cab, params};

use cabrig_core::api::{Namespace, ParamValue, ParameterValidationError, ValidationFlags};
use pretty_assertions::assert_eq;
use serde_json::json;

const IMAGER: &str = r#"
    name = "imager"
    command = "imager"

    [inputs.image]
    dtype = "str"
    required = true

    [inputs.ncpu]
    dtype = "int"
    default = 4

    [inputs.mode]
    dtype = "str"
    choices = ["dirty", "clean"]

    [outputs.fits]
    dtype = "str"
    default = "{self.image}-restored.fits"
"#;

#[test]
fn defaults_coercion_and_markers_flow_through() {
    let mut imager = cab(IMAGER);
    let validated = imager
        .validate(
            &params(&[("image", "m31".into()), ("ncpu", "8".into())]),
            None,
            ValidationFlags::default(),
        )
        .expect("validation passes")
        .clone();

    assert_eq!(validated["image"], ParamValue::Str("m31".into()));
    // String input coerced to the declared int dtype.
    assert_eq!(validated["ncpu"], ParamValue::Int(8));
    // No namespace: the templated default survives as an unresolved marker.
    assert_eq!(
        validated["fits"],
        ParamValue::Unresolved("{self.image}-restored.fits".into())
    );
    assert!(!validated.contains_key("mode"));
}

#[test]
fn namespace_resolves_templated_defaults() {
    let mut imager = cab(IMAGER);
    let validated = imager
        .validate(
            &params(&[("image", "m31".into())]),
            Some(&Namespace::strict()),
            ValidationFlags::default(),
        )
        .expect("validation passes");

    assert_eq!(
        validated["fits"],
        ParamValue::Str("m31-restored.fits".into())
    );
}

#[test]
fn caller_namespace_entries_resolve_too() {
    let mut imager = cab(IMAGER);
    let mut ns = Namespace::strict();
    ns.set("obs", json!({"target": "3c286"}));
    let validated = imager
        .validate(
            &params(&[("image", "{obs.target}-cube".into())]),
            Some(&ns),
            ValidationFlags::default(),
        )
        .expect("validation passes");

    assert_eq!(validated["image"], ParamValue::Str("3c286-cube".into()));
    assert_eq!(
        validated["fits"],
        ParamValue::Str("3c286-cube-restored.fits".into())
    );
}

#[test]
fn missing_required_parameter_is_named() {
    let mut imager = cab(IMAGER);
    let err = imager
        .validate(&params(&[]), None, ValidationFlags::default())
        .unwrap_err();
    match err {
        ParameterValidationError::MissingRequired { names } => {
            assert_eq!(names, vec!["image".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn ignoring_missing_required_is_a_switch() {
    let mut imager = cab(IMAGER);
    let flags = ValidationFlags {
        check_required: false,
        ..ValidationFlags::default()
    };
    let validated = imager
        .validate(&params(&[]), None, flags)
        .expect("missing required tolerated");
    assert!(!validated.contains_key("image"));
    assert_eq!(validated["ncpu"], ParamValue::Int(4));
}

#[test]
fn choice_violations_name_value_and_parameter() {
    let mut imager = cab(IMAGER);
    let err = imager
        .validate(
            &params(&[("image", "m31".into()), ("mode", "fuzzy".into())]),
            None,
            ValidationFlags::default(),
        )
        .unwrap_err();
    match err {
        ParameterValidationError::Parameter { name, reason } => {
            assert_eq!(name, "mode");
            assert_eq!(reason, "invalid value 'fuzzy'");
        }
        other => panic!("unexpected {other:?}"),
    }

    let mut imager = cab(IMAGER);
    let validated = imager
        .validate(
            &params(&[("image", "m31".into()), ("mode", "clean".into())]),
            None,
            ValidationFlags::default(),
        )
        .expect("allowed choice passes");
    assert_eq!(validated["mode"], ParamValue::Str("clean".into()));
}

#[test]
fn unknown_parameters_reject_or_drop_by_flag() {
    let mut imager = cab(IMAGER);
    let input = params(&[("image", "m31".into()), ("rogue", 1.into())]);

    let err = imager
        .validate(&input, None, ValidationFlags::default())
        .unwrap_err();
    match err {
        ParameterValidationError::UnknownParameters { names } => {
            assert_eq!(names, vec!["rogue".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }

    let flags = ValidationFlags {
        check_unknowns: false,
        ..ValidationFlags::default()
    };
    let validated = imager.validate(&input, None, flags).expect("rogue dropped");
    assert!(!validated.contains_key("rogue"));
}

#[test]
fn type_failures_aggregate_across_parameters() {
    let mut imager = cab(IMAGER);
    let err = imager
        .validate(
            &params(&[
                ("image", "m31".into()),
                ("ncpu", "many".into()),
                ("mode", ParamValue::List(vec!["clean".into()])),
            ]),
            None,
            ValidationFlags::default(),
        )
        .unwrap_err();
    match err {
        ParameterValidationError::TypeCheck { errors } => {
            let names: Vec<&str> = errors.iter().map(|e| e.name.as_str()).collect();
            assert_eq!(names, ["ncpu", "mode"]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn file_globs_expand_sorted_against_the_filesystem() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["b.ms", "a.ms", "c.txt"] {
        std::fs::create_dir(dir.path().join(name)).expect("fixture dir");
    }

    let mut lister = cab(
        r#"
        name = "lister"
        command = "lister"

        [inputs.vis]
        dtype = "List[Directory]"
        required = true
        "#,
    );
    let pattern = format!("{}/*.ms", dir.path().display());
    let validated = lister
        .validate(
            &params(&[("vis", pattern.as_str().into())]),
            None,
            ValidationFlags::default(),
        )
        .expect("glob expands");

    let expected = ParamValue::List(vec![
        format!("{}/a.ms", dir.path().display()).into(),
        format!("{}/b.ms", dir.path().display()).into(),
    ]);
    assert_eq!(validated["vis"], expected);
}

#[test]
fn empty_glob_honors_the_existence_switch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut reader = cab(
        r#"
        name = "reader"
        command = "reader"

        [inputs.table]
        dtype = "File"
        required = true
        "#,
    );
    let pattern = format!("{}/absent-*.fits", dir.path().display());

    let err = reader
        .validate(
            &params(&[("table", pattern.as_str().into())]),
            None,
            ValidationFlags::default(),
        )
        .unwrap_err();
    match err {
        ParameterValidationError::Parameter { name, reason } => {
            assert_eq!(name, "table");
            assert!(reason.starts_with("no files found"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }

    let flags = ValidationFlags {
        check_exist: false,
        ..ValidationFlags::default()
    };
    let validated = reader
        .validate(&params(&[("table", pattern.as_str().into())]), None, flags)
        .expect("existence check off");
    assert_eq!(validated["table"], ParamValue::Str(String::new()));
}

#[test]
fn revalidating_validated_output_is_identity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("in.dat");
    std::fs::write(&data, b"x").expect("fixture file");

    let mut worker = cab(
        r#"
        name = "worker"
        command = "worker"

        [inputs.data]
        dtype = "File"
        required = true

        [inputs.ncpu]
        dtype = "int"
        default = 2

        [inputs.tag]
        dtype = "str"
        "#,
    );
    let input = params(&[
        ("data", data.display().to_string().as_str().into()),
        ("tag", "{self.ncpu}-way".into()),
    ]);
    let ns = Namespace::strict();

    let first = worker
        .validate(&input, Some(&ns), ValidationFlags::default())
        .expect("first pass")
        .clone();
    let second = worker
        .validate(&first, Some(&ns), ValidationFlags::default())
        .expect("second pass")
        .clone();

    assert_eq!(first, second);
    assert_eq!(second["tag"], ParamValue::Str("2-way".into()));
}

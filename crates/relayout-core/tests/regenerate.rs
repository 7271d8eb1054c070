//! End-to-end regeneration of trees loaded from JSON documents

use relayout_core::{
    apply_edits, load_edited, load_original, regenerate, PrettyPrinter, RegenConfig, SourceFile,
    UnitSet,
};

const SOURCE: &str = "{\n  f(a, b) // call\n  g\n}";

const ORIGINAL: &str = r#"{
    "file": "Main.scala",
    "root": {
        "kind": "block", "id": "root", "pos": [0, 25],
        "stats": [
            {
                "kind": "apply", "id": "call", "pos": [4, 11],
                "fun": {"kind": "ident", "id": "f", "name": "f", "pos": [4, 5]},
                "args": [
                    {"kind": "ident", "id": "a", "name": "a", "pos": [6, 7]},
                    {"kind": "ident", "id": "b", "name": "b", "pos": [9, 10]}
                ]
            },
            {"kind": "ident", "id": "g", "name": "g", "pos": [22, 23]}
        ]
    }
}"#;

fn regenerate_with(edited: &str) -> (String, usize) {
    let source = SourceFile::new("Main.scala", SOURCE);
    let original = load_original(&source, ORIGINAL).unwrap();
    let edited = load_edited(&source, edited, &original).unwrap();

    let units = UnitSet::new().with_unit(source.clone(), original.into_root());
    let result = regenerate(
        &units,
        &PrettyPrinter::default(),
        &RegenConfig::default(),
        edited.root(),
    )
    .unwrap();
    assert!(result.diagnostics.is_empty());

    let text = apply_edits(source.text(), &result.edits).unwrap();
    (text, result.edits.len())
}

#[test]
fn test_identity_transformation_is_a_no_op() {
    let (text, edits) = regenerate_with(r#"{"file": "Main.scala", "root": {"ref": "root"}}"#);
    assert_eq!(edits, 0);
    assert_eq!(text, SOURCE);
}

#[test]
fn test_rebuilt_but_equal_tree_is_a_no_op() {
    let (text, edits) = regenerate_with(
        r#"{"file": "Main.scala", "root": {
            "kind": "block", "pos": [0, 25],
            "stats": [{"ref": "call"}, {"ref": "g"}]
        }}"#,
    );
    assert_eq!(edits, 0);
    assert_eq!(text, SOURCE);
}

#[test]
fn test_swapped_arguments_keep_comment() {
    let (text, edits) = regenerate_with(
        r#"{"file": "Main.scala", "root": {
            "kind": "block", "pos": [0, 25],
            "stats": [
                {"kind": "apply", "pos": [4, 11], "fun": {"ref": "f"}, "args": [{"ref": "b"}, {"ref": "a"}]},
                {"ref": "g"}
            ]
        }}"#,
    );
    assert_eq!(edits, 1);
    assert_eq!(text, "{\n  f(b, a) // call\n  g\n}");
}

#[test]
fn test_replaced_statement_is_narrowed() {
    let (text, edits) = regenerate_with(
        r#"{"file": "Main.scala", "root": {
            "kind": "block", "pos": [0, 25],
            "stats": [
                {"ref": "call"},
                {"kind": "apply", "fun": {"kind": "ident", "name": "log"}}
            ]
        }}"#,
    );
    assert_eq!(edits, 1);
    assert_eq!(text, "{\n  f(a, b) // call\n  log()\n}");
}

#[test]
fn test_appended_definition() {
    let (text, _) = regenerate_with(
        r#"{"file": "Main.scala", "root": {
            "kind": "block", "pos": [0, 25],
            "stats": [
                {"ref": "call"},
                {"ref": "g"},
                {"kind": "val", "name": "x", "rhs": {"kind": "literal", "value": 1}}
            ]
        }}"#,
    );
    assert_eq!(text, "{\n  f(a, b) // call\n  g\n  val x = 1\n}");
}

#[test]
fn test_prepended_definition() {
    let (text, edits) = regenerate_with(
        r#"{"file": "Main.scala", "root": {
            "kind": "block", "pos": [0, 25],
            "stats": [
                {"kind": "val", "name": "x", "rhs": {"kind": "literal", "value": 1}},
                {"ref": "call"},
                {"ref": "g"}
            ]
        }}"#,
    );
    assert_eq!(edits, 1);
    assert_eq!(text, "{\n  val x = 1\n  f(a, b) // call\n  g\n}");
}

#[test]
fn test_units_regenerate_on_separate_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                regenerate_with(
                    r#"{"file": "Main.scala", "root": {
                        "kind": "block", "pos": [0, 25],
                        "stats": [{"ref": "call"}, {"kind": "ident", "name": "h", "pos": [22, 23]}]
                    }}"#,
                )
            })
        })
        .collect();

    for handle in handles {
        let (text, edits) = handle.join().unwrap();
        assert_eq!(edits, 1);
        assert_eq!(text, "{\n  f(a, b) // call\n  h\n}");
    }
}

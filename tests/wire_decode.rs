//! Query-result rows decode to the same tables fixtures parse to.

use nested_fixtures::{
    build_table, decode, decode_response, fingerprint, tables_equal, CatalogField, Record, Schema,
    Value, WireRow,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn nested_schema() -> Schema {
    Schema::from_catalog(&[
        CatalogField::string("c1"),
        CatalogField::record(
            "c2",
            vec![
                CatalogField::record("x", vec![CatalogField::integer("xx")]).repeated(),
                CatalogField::string("y"),
            ],
        )
        .repeated(),
    ])
    .unwrap()
}

fn response_rows() -> Vec<WireRow> {
    serde_json::from_value(json!([
        {"f": [{"v": "foo"},
               {"v": [{"v": {"f": [{"v": [{"v": {"f": [{"v": "1"}]}}]},
                                   {"v": "a"}]}}]}]},
        {"f": [{"v": "baz"},
               {"v": [{"v": {"f": [{"v": [{"v": {"f": [{"v": "3"}]}},
                                          {"v": {"f": [{"v": "4"}]}}]},
                                   {"v": "b"}]}},
                      {"v": {"f": [{"v": [{"v": {"f": [{"v": "5"}]}}]},
                                   {"v": "d"}]}}]}]},
        {"f": [{"v": "bar"},
               {"v": [{"v": {"f": [{"v": []}, {"v": "b"}]}}]}]}
    ]))
    .unwrap()
}

const FIXTURE: &str = "
    c1   c2.x.xx  c2.y
    foo  1        a
    baz  3        b
         4
         5        d
    bar           b
";

fn xs(values: &[i64]) -> Value {
    Value::Repeated(
        values
            .iter()
            .map(|v| Value::Record(Record::new().with("xx", *v)))
            .collect(),
    )
}

#[test]
fn test_table_from_api_response() {
    let table = decode(&response_rows(), &nested_schema()).unwrap();
    assert_eq!(
        table.records(),
        &[
            Record::new()
                .with("c1", "foo")
                .with("c2", vec![Record::new().with("x", xs(&[1])).with("y", "a")]),
            Record::new().with("c1", "baz").with(
                "c2",
                vec![
                    Record::new().with("x", xs(&[3, 4])).with("y", "b"),
                    Record::new().with("x", xs(&[5])).with("y", "d"),
                ]
            ),
            Record::new()
                .with("c1", "bar")
                .with("c2", vec![Record::new().with("y", "b")]),
        ]
    );
}

#[test]
fn test_decode_and_parse_agree() {
    let decoded = decode(&response_rows(), &nested_schema()).unwrap();
    let parsed = build_table(FIXTURE, &nested_schema()).unwrap();

    assert_eq!(decoded.records(), parsed.records());
    assert_eq!(decoded.to_string(), parsed.to_string());
    assert_eq!(fingerprint(&decoded), fingerprint(&parsed));
    assert!(tables_equal(&decoded, &parsed));
}

#[test]
fn test_decoded_table_renders_as_fixture() {
    let decoded = decode(&response_rows(), &nested_schema()).unwrap();
    let expected = "\
c1   c2.x.xx  c2.y
foo  1        a
baz  3        b
     4
     5        d
bar           b";
    assert_eq!(decoded.to_string(), expected);
}

#[test]
fn test_decode_response_object() {
    let json = json!({
        "kind": "bigquery#queryResponse",
        "rows": serde_json::to_value(response_rows()).unwrap(),
        "jobComplete": true
    })
    .to_string();
    let table = decode_response(&json, &nested_schema()).unwrap();
    assert_eq!(table.len(), 3);
}

#[test]
fn test_null_sentinel_survives_both_paths() {
    let schema =
        Schema::from_catalog(&[CatalogField::string("c1"), CatalogField::integer("n")]).unwrap();
    let rows: Vec<WireRow> =
        serde_json::from_value(json!([{"f": [{"v": "a"}, {"v": "null"}]}])).unwrap();

    let decoded = decode(&rows, &schema).unwrap();
    let parsed = build_table("c1  n\na   null", &schema).unwrap();

    assert_eq!(
        decoded.records(),
        &[Record::new().with("c1", "a").with("n", Value::Null)]
    );
    assert_eq!(decoded.records(), parsed.records());
    assert_eq!(fingerprint(&decoded), fingerprint(&parsed));
}

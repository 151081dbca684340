use std::io::Write as _;

use super::*;

fn entry(id: &str, kind: &str, url: &str) -> TargetEntry {
    TargetEntry {
        id: Some(id.to_string()),
        kind: Some(kind.to_string()),
        url: Some(url.to_string()),
        ..TargetEntry::default()
    }
}

#[test]
fn sanitize_replaces_runs_of_unsafe_characters() {
    assert_eq!(sanitize_target_key("  canyon aeroad / CF SLX  "), "canyon_aeroad_CF_SLX");
    assert_eq!(sanitize_target_key("shop.example.com"), "shop_example_com");
    assert_eq!(sanitize_target_key("keep-this_one"), "keep-this_one");
    assert_eq!(sanitize_target_key("grüne Tee"), "gr_ne_Tee");
}

#[test]
fn validate_fills_label_and_defaults() {
    let mut e = entry("mnstry", "catalog_json", "https://mnstry.com/");
    e.label = None;
    let target = e.validate().unwrap();
    assert_eq!(target.label, "mnstry");
    assert_eq!(target.key, "mnstry");
    assert_eq!(target.url, "https://mnstry.com");
    assert_eq!(target.kind, TargetKind::CatalogJson);
    assert_eq!(target.reference_price_class, DEFAULT_REFERENCE_PRICE_CLASS);
}

#[test]
fn validate_rejects_empty_id() {
    let e = entry("   ", "catalog_json", "https://mnstry.com");
    let err = e.validate().unwrap_err();
    assert!(err.to_string().contains("id must be non-empty"));
}

#[test]
fn validate_rejects_missing_url() {
    let mut e = entry("x", "catalog_json", "");
    e.url = None;
    let err = e.validate().unwrap_err();
    assert!(err.to_string().contains("has no url"));
}

#[test]
fn validate_requires_currency_for_structured_metadata() {
    let e = entry("bike", "structured_metadata", "https://www.canyon.com/p/1");
    let err = e.validate().unwrap_err();
    assert!(err.to_string().contains("needs a currency"));
}

#[test]
fn validate_requires_keywords_for_link_discovery() {
    let mut e = entry("enjoy", "link_discovery", "https://enjoy365.ch/alle-produkte/");
    e.keywords = vec!["  ".to_string()];
    let err = e.validate().unwrap_err();
    assert!(err.to_string().contains("at least one keyword"));
}

#[test]
fn validate_rejects_unknown_kind() {
    let e = entry("x", "rss", "https://example.com");
    let err = e.validate().unwrap_err();
    assert!(err.to_string().contains("unknown target kind"));
}

#[test]
fn validate_parses_threshold_and_rates() {
    let yaml = r#"
- id: forerunner
  kind: structured_metadata
  url: https://shop.example.ch/p/965
  currency: chf
  price_threshold: 400.00
  fx_rates:
    eur: "0.97"
"#;
    let file = parse_targets(yaml).unwrap();
    let target = file.targets[0].validate().unwrap();
    assert_eq!(target.currency.as_deref(), Some("CHF"));
    assert_eq!(target.price_threshold, Some(Decimal::new(400, 0)));
    assert_eq!(target.fx_rates.get("EUR"), Some(&Decimal::new(97, 2)));
}

#[test]
fn validate_rejects_non_positive_rate() {
    let yaml = r#"
- id: x
  kind: structured_metadata
  url: https://shop.example.ch/p/965
  currency: CHF
  fx_rates: { EUR: 0 }
"#;
    let file = parse_targets(yaml).unwrap();
    let err = file.targets[0].validate().unwrap_err();
    assert!(err.to_string().contains("must be positive"));
}

#[test]
fn parse_targets_accepts_wrapped_and_bare_lists() {
    let wrapped = "targets:\n  - id: a\n    url: https://a.example\n";
    let bare = r#"[{"id": "a", "url": "https://a.example", "kind": "catalog_json"}]"#;
    assert_eq!(parse_targets(wrapped).unwrap().targets.len(), 1);
    assert_eq!(parse_targets(bare).unwrap().targets.len(), 1);
}

#[test]
fn parse_targets_rejects_non_list_document() {
    let result = parse_targets("just a string");
    assert!(matches!(result, Err(ConfigError::TargetsFileParse(_))));
}

#[test]
fn parse_targets_rejects_colliding_keys() {
    let yaml = r#"
- id: "shop a"
  url: https://a.example
- id: "shop/a"
  url: https://b.example
"#;
    let err = parse_targets(yaml).unwrap_err();
    assert!(
        err.to_string().contains("state key 'shop_a'"),
        "unexpected error: {err}"
    );
}

#[test]
fn parse_targets_keeps_invalid_entries_for_the_runner() {
    let yaml = r#"
- id: good
  kind: catalog_json
  url: https://a.example
- label: "no id"
"#;
    let file = parse_targets(yaml).unwrap();
    assert_eq!(file.targets.len(), 2);
    assert!(file.targets[0].validate().is_ok());
    assert!(file.targets[1].validate().is_err());
    assert_eq!(file.targets[1].display_id(), "unknown");
}

#[test]
fn load_targets_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "targets:\n  - id: a\n    kind: catalog_json\n    url: https://a.example").unwrap();
    let loaded = load_targets(file.path()).unwrap();
    assert_eq!(loaded.targets[0].display_id(), "a");
}

#[test]
fn load_targets_reports_missing_file() {
    let result = load_targets(Path::new("/definitely/not/here/targets.yaml"));
    assert!(matches!(result, Err(ConfigError::TargetsFileIo { .. })));
}

#[test]
fn example_targets_file_is_valid() {
    let file = parse_targets(include_str!("../../../config/targets.example.yaml")).unwrap();
    let kinds: Vec<TargetKind> = file
        .targets
        .iter()
        .map(|e| e.validate().unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TargetKind::StructuredMetadata,
            TargetKind::CatalogJson,
            TargetKind::LinkDiscovery
        ]
    );
}

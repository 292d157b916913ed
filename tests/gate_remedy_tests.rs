/// Leaf gate and remedy table tests
///
/// Run with: cargo test --test gate_remedy_tests -- --nocapture

use std::collections::HashMap;

use leaf_predictor::{
    ConfigError, DiseaseClass, LabelPrediction, LeafGate, LeafVocabulary, RemedyTable,
};

fn gate() -> LeafGate {
    LeafGate::new(LeafVocabulary::default()).unwrap()
}

fn preds(labels: &[&str]) -> Vec<LabelPrediction> {
    labels
        .iter()
        .map(|l| LabelPrediction::new(*l, 0.1))
        .collect()
}

#[test]
fn test_gate_substring_and_case() {
    println!("\n=== Test: Gate Matching ===");
    let g = gate();

    assert!(g.is_leaf(&preds(&["Banana"])));
    assert!(g.is_leaf(&preds(&["cabbage butterfly"])));
    assert!(g.is_leaf(&preds(&["sports car", "GRAPEFRUIT"])));
    assert!(g.is_leaf(&preds(&["ear", "corn"])));
    assert!(!g.is_leaf(&preds(&["sports car", "tabby", "laptop"])));
    println!("✓ Case-insensitive substring matching");
}

#[test]
fn test_gate_ignores_probability() {
    println!("\n=== Test: Gate Ignores Probability ===");
    let g = gate();
    let low = vec![
        LabelPrediction::new("sports car", 0.99),
        LabelPrediction::new("pot plant", 0.0001),
    ];
    assert!(g.is_leaf(&low));
    println!("✓ Presence in top-K is enough");
}

#[test]
fn test_gate_empty_predictions() {
    println!("\n=== Test: Empty Predictions ===");
    assert!(!gate().is_leaf(&[]));
    println!("✓ Nothing to match, rejected");
}

#[test]
fn test_gate_reports_match() {
    println!("\n=== Test: Gate Match Details ===");
    let g = gate();
    let p = preds(&["sports car", "Vine Snake", "tree frog"]);
    assert_eq!(g.find_match(&p), Some(("Vine Snake", "vine")));
    assert_eq!(g.version(), "v1");
    println!("✓ First matching label reported");
}

#[test]
fn test_custom_vocabulary() {
    println!("\n=== Test: Custom Vocabulary ===");
    let g = LeafGate::new(LeafVocabulary {
        version: "strict-1".to_string(),
        keywords: vec!["  Leaf ".to_string(), "".to_string()],
    })
    .unwrap();

    assert!(g.is_leaf(&preds(&["leaf beetle"])));
    assert!(!g.is_leaf(&preds(&["banana"])));
    assert_eq!(g.version(), "strict-1");
    println!("✓ Keywords trimmed and lowercased");
}

#[test]
fn test_empty_vocabulary_rejected() {
    println!("\n=== Test: Empty Vocabulary ===");
    let err = LeafGate::new(LeafVocabulary {
        version: "empty".to_string(),
        keywords: vec![" ".to_string()],
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::EmptyVocabulary(v) if v == "empty"));
    println!("✓ Empty vocabulary is a configuration error");
}

#[test]
fn test_default_remedy_table_is_total() {
    println!("\n=== Test: Remedy Table Totality ===");
    let table = RemedyTable::default();
    table.ensure_total().unwrap();
    for class in DiseaseClass::ALL {
        let remedy = table.lookup(class).unwrap();
        println!("  {} -> {}", class, remedy);
        assert!(!remedy.is_empty());
    }
    assert_eq!(
        table.lookup(DiseaseClass::Healthy).unwrap(),
        "No disease detected. Maintain regular vineyard monitoring."
    );
    println!("✓ Every class has a remedy");
}

#[test]
fn test_partial_table_fails_totality() {
    println!("\n=== Test: Partial Remedy Table ===");
    let table = RemedyTable::from_entries([
        (DiseaseClass::BlackRot, "a"),
        (DiseaseClass::Esca, "b"),
        (DiseaseClass::Healthy, "d"),
    ]);
    assert!(matches!(
        table.ensure_total(),
        Err(ConfigError::MissingRemedy(DiseaseClass::LeafBlight))
    ));
    assert!(table.lookup(DiseaseClass::LeafBlight).is_err());
    assert_eq!(table.lookup(DiseaseClass::Esca).unwrap(), "b");
    println!("✓ Missing entry detected");
}

#[test]
fn test_remedy_overrides() {
    println!("\n=== Test: Remedy Overrides ===");
    let mut overrides = HashMap::new();
    overrides.insert("Leaf Blight".to_string(), "Spray copper weekly.".to_string());
    let table = RemedyTable::default().with_overrides(&overrides).unwrap();
    assert_eq!(
        table.lookup(DiseaseClass::LeafBlight).unwrap(),
        "Spray copper weekly."
    );
    assert_eq!(
        table.lookup(DiseaseClass::BlackRot).unwrap(),
        "Remove infected leaves and apply fungicide like Mancozeb."
    );

    overrides.insert("Powdery Mildew".to_string(), "x".to_string());
    let err = RemedyTable::default().with_overrides(&overrides).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownClass(l) if l == "Powdery Mildew"));
    println!("✓ Overrides applied, unknown labels rejected");
}

#[test]
fn test_class_order_and_labels() {
    println!("\n=== Test: Class Order ===");
    let labels: Vec<&str> = DiseaseClass::ALL.iter().map(|c| c.label()).collect();
    assert_eq!(
        labels,
        vec!["Black Rot", "Esca (Black Measles)", "Leaf Blight", "Healthy"]
    );
    for (i, class) in DiseaseClass::ALL.iter().enumerate() {
        assert_eq!(class.index(), i);
        assert_eq!(DiseaseClass::from_index(i), Some(*class));
        assert_eq!(DiseaseClass::from_label(class.label()), Some(*class));
    }
    assert_eq!(DiseaseClass::from_index(4), None);
    println!("✓ Index order matches label table");
}

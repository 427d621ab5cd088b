use std::sync::Arc;
use std::thread;

use grid_severity::grid::{GridModel, FREQUENCY, LOAD, SEVERITY, VOLTAGE};
use grid_severity::severity::{Action, AssessError, Assessor, Fallback, Reading, SeverityBands, SeverityLevel};
use grid_severity::{
    DefuzzificationOp, FuzzyError, ImplicationOp, InferenceEngine, Inputs, Operators, Role, Rules, Terms, Universe,
    Variables,
};

fn assessor(bands: SeverityBands) -> Assessor {
    Assessor::new(GridModel::new().unwrap(), bands, Fallback::Fail).unwrap()
}

#[test]
fn severe_anomaly_needs_isolation() {
    let assessment = assessor(SeverityBands::SERVICE)
        .assess(&Reading::new(20., 2., 100.))
        .unwrap();
    let score = assessment.severity_score.unwrap();

    assert!((score - 63.529_850_746).abs() < 1e-6, "score {score}");
    assert_eq!(assessment.severity_level, SeverityLevel::High);
    assert_eq!(
        assessment.suggested_action.to_string(),
        "Immediate Isolation and Load Rerouting"
    );

    // The console collector's wider Moderate band keeps the same score Moderate
    let console = assessor(SeverityBands::CONSOLE)
        .assess(&Reading::new(20., 2., 100.))
        .unwrap();

    assert_eq!(console.severity_level, SeverityLevel::Moderate);
}

#[test]
fn quiet_grid_needs_nothing() {
    let assessment = assessor(SeverityBands::SERVICE)
        .assess(&Reading::new(0., 0., 0.))
        .unwrap();
    let score = assessment.severity_score.unwrap();

    assert!((score - 29. / 3.).abs() < 1e-6, "score {score}");
    assert_eq!(assessment.severity_level, SeverityLevel::Low);
    assert_eq!(assessment.suggested_action, Action::NoAction);
}

#[test]
fn medium_disturbance_balances_load() {
    let assessment = assessor(SeverityBands::SERVICE)
        .assess(&Reading::new(10., 0.7, 50.))
        .unwrap();

    assert_eq!(assessment.severity_score, Some(50.));
    assert_eq!(assessment.severity_level, SeverityLevel::Moderate);
    assert_eq!(
        assessment.suggested_action.to_string(),
        "Activate Load Balancing and Monitoring"
    );
}

#[test]
fn uncovered_reading_fires_no_rule() {
    let model = GridModel::new().unwrap();

    assert_eq!(
        model.severity(&Reading::new(10., 2., 100.)),
        Err(FuzzyError::NoRuleFired {
            variable: SEVERITY.to_owned()
        })
    );
}

#[test]
fn out_of_range_reading_is_rejected_before_inference() {
    let assessor = assessor(SeverityBands::SERVICE);

    assert!(matches!(
        assessor.assess(&Reading::new(25., 1., 50.)),
        Err(AssessError::InputOutOfRange { field: "voltage", .. })
    ));
    assert!(matches!(
        assessor.assess(&Reading::new(5., 1., f64::INFINITY)),
        Err(AssessError::InputOutOfRange { field: "load", .. })
    ));
}

#[test]
fn engine_reports_missing_and_foreign_inputs() {
    let model = GridModel::new().unwrap();
    let engine = model.engine();

    let partial: Inputs = [(VOLTAGE, 10.), (FREQUENCY, 0.7)].into_iter().collect();
    assert_eq!(
        engine.infer(&partial).unwrap_err(),
        FuzzyError::MissingInput {
            variable: LOAD.to_owned()
        }
    );

    let foreign: Inputs = [(VOLTAGE, 10.), (FREQUENCY, 0.7), (LOAD, 50.), ("Humidity", 1.)]
        .into_iter()
        .collect();
    assert!(matches!(engine.infer(&foreign), Err(FuzzyError::UnknownVariable { .. })));

    let output_as_input: Inputs = [(VOLTAGE, 10.), (FREQUENCY, 0.7), (LOAD, 50.), (SEVERITY, 1.)]
        .into_iter()
        .collect();
    assert!(matches!(engine.infer(&output_as_input), Err(FuzzyError::NotAnInput { .. })));
}

#[test]
fn alternative_operators_change_the_score() {
    let ops = Operators {
        imp_op: ImplicationOp::Prod,
        defuzz_op: DefuzzificationOp::MeanOfMaximum,
        ..Operators::default()
    };
    let model = GridModel::with_operators(ops).unwrap();

    // Both fired rules name Moderate, whose single peak sits at 50
    assert_eq!(model.severity(&Reading::new(10., 0.7, 50.)), Ok(50.));
    assert_eq!(model.engine().operators(), ops);
}

#[test]
fn configuration_errors_are_reported() {
    let mut terms = Terms::new();
    assert!(matches!(
        terms.triangle("Bent", 5., 1., 10.),
        Err(FuzzyError::InvalidMembership { .. })
    ));

    let mut twice = Terms::new();
    twice.triangle("Low", 0., 0., 5.).unwrap();
    twice.triangle("Low", 0., 5., 10.).unwrap();
    let mut vars = Variables::new();
    assert!(matches!(
        vars.add_input("x", Universe::new(0., 10., 1.).unwrap(), twice),
        Err(FuzzyError::DuplicateTerm { .. })
    ));

    let mut terms = Terms::new();
    terms.triangle("Low", 0., 0., 10.).unwrap();
    let x = vars
        .add_input("x", Universe::new(0., 10., 1.).unwrap(), terms.clone())
        .unwrap();
    let y = vars
        .add_output("y", Universe::new(0., 10., 1.).unwrap(), terms)
        .unwrap();

    let mut rules = Rules::new();
    rules.add(x.is("Lowish"), y.is("Low"));
    assert_eq!(
        InferenceEngine::new(vars.clone(), rules).unwrap_err(),
        FuzzyError::UnknownTerm {
            variable: "x".to_owned(),
            label: "Lowish".to_owned()
        }
    );

    // Handles from a second registry occupy the same slots as x and y
    let mut other = Variables::new();
    let mut low = Terms::new();
    low.triangle("Low", 0., 0., 10.).unwrap();
    let fx = other
        .add_input("fx", Universe::new(0., 10., 1.).unwrap(), low.clone())
        .unwrap();
    let fy = other
        .add_output("fy", Universe::new(0., 10., 1.).unwrap(), low)
        .unwrap();
    let mut rules = Rules::new();
    rules.add(fx.is("Low"), fy.is("Low"));
    assert!(matches!(
        InferenceEngine::new(vars.clone(), rules),
        Err(FuzzyError::UnknownVariable { .. })
    ));

    let mut rules = Rules::new();
    rules.add(y.is("Low"), x.is("Low"));
    match InferenceEngine::new(vars, rules) {
        Err(FuzzyError::RoleMismatch { found, declared, .. }) => {
            assert_eq!(found, Role::Input);
            assert_eq!(declared, Role::Output);
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn shared_assessor_agrees_across_threads() {
    let assessor = Arc::new(assessor(SeverityBands::SERVICE));
    let readings: Vec<_> = (0..=20)
        .flat_map(|v| (0..=4).map(move |f| Reading::new(v as f64, f as f64 * 0.5, (v * 5) as f64)))
        .collect();

    let sequential: Vec<_> = readings
        .iter()
        .map(|r| assessor.assess(r).map_err(|e| e.to_string()))
        .collect();

    let handles: Vec<_> = readings
        .chunks(16)
        .map(|chunk| {
            let assessor = Arc::clone(&assessor);
            let chunk = chunk.to_vec();

            thread::spawn(move || {
                chunk
                    .iter()
                    .map(|r| assessor.assess(r).map_err(|e| e.to_string()))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let concurrent: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();

    assert_eq!(sequential, concurrent);
}

#[test]
fn detect_handles_json_requests() {
    let assessor = Assessor::new(GridModel::new().unwrap(), SeverityBands::SERVICE, Fallback::AssumeLow).unwrap();

    let response = assessor
        .detect(r#"{"voltage": 20, "frequency": 2.0, "load": 100}"#)
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(json["severity_level"], "High Severity");
    assert_eq!(json["suggested_action"], "Immediate Isolation and Load Rerouting");

    let response = assessor
        .detect(r#"{"voltage": 10, "frequency": 2.0, "load": 100}"#)
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert!(json["severity_score"].is_null());
    assert_eq!(json["severity_level"], "Low Severity");
    assert_eq!(json["suggested_action"], "No Action Required");

    assert!(matches!(
        assessor.detect(r#"{"voltage": 30, "frequency": 1, "load": 1}"#),
        Err(AssessError::InputOutOfRange { .. })
    ));
}

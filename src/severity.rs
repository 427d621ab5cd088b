//! Turns a crisp severity score into a severity level and a suggested
//! action, and exposes the request handler used by outer shells.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::FuzzyError;
use crate::grid::GridModel;

#[derive(Debug, Error)]
pub enum AssessError {
    #[error(transparent)]
    Inference(#[from] FuzzyError),

    #[error("{field} = {value} is outside [{min}, {max}]")]
    InputOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid severity bands ({moderate_from}, {high_from}): {reason}")]
    InvalidBands {
        moderate_from: f64,
        high_from: f64,
        reason: &'static str,
    },

    #[error("malformed request: {0}")]
    Request(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum SeverityLevel {
    #[serde(rename = "Low Severity")]
    Low,
    #[serde(rename = "Moderate Severity")]
    Moderate,
    #[serde(rename = "High Severity")]
    High,
}

impl SeverityLevel {
    pub fn action(self) -> Action {
        match self {
            Self::Low => Action::NoAction,
            Self::Moderate => Action::LoadBalancing,
            Self::High => Action::IsolateAndReroute,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Severity",
            Self::Moderate => "Moderate Severity",
            Self::High => "High Severity",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "No Action Required")]
    NoAction,
    #[serde(rename = "Activate Load Balancing and Monitoring")]
    LoadBalancing,
    #[serde(rename = "Immediate Isolation and Load Rerouting")]
    IsolateAndReroute,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoAction => "No Action Required",
            Self::LoadBalancing => "Activate Load Balancing and Monitoring",
            Self::IsolateAndReroute => "Immediate Isolation and Load Rerouting",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score boundaries: below `moderate_from` is Low, below `high_from` is
/// Moderate, anything else High.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeverityBands {
    pub moderate_from: f64,
    pub high_from: f64,
}

impl SeverityBands {
    /// Boundaries used by the request handler
    pub const SERVICE: Self = Self {
        moderate_from: 30.,
        high_from: 60.,
    };
    /// Boundaries used by the console collector
    pub const CONSOLE: Self = Self {
        moderate_from: 30.,
        high_from: 70.,
    };

    pub fn new(moderate_from: f64, high_from: f64) -> Result<Self, AssessError> {
        let bands = Self {
            moderate_from,
            high_from,
        };

        bands.validate()?;

        Ok(bands)
    }

    pub fn validate(&self) -> Result<(), AssessError> {
        let invalid = |reason| AssessError::InvalidBands {
            moderate_from: self.moderate_from,
            high_from: self.high_from,
            reason,
        };

        if !(self.moderate_from.is_finite() && self.high_from.is_finite()) {
            return Err(invalid("boundaries must be finite"));
        }
        if self.moderate_from >= self.high_from {
            return Err(invalid("moderate_from must be below high_from"));
        }

        Ok(())
    }

    pub fn classify(&self, score: f64) -> SeverityLevel {
        if score < self.moderate_from {
            SeverityLevel::Low
        } else if score < self.high_from {
            SeverityLevel::Moderate
        } else {
            SeverityLevel::High
        }
    }
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self::SERVICE
    }
}

/// One monitoring sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub voltage: f64,
    pub frequency: f64,
    pub load: f64,
}

impl Reading {
    pub const VOLTAGE_RANGE: RangeInclusive<f64> = 0.0..=20.0;
    pub const FREQUENCY_RANGE: RangeInclusive<f64> = 0.0..=2.0;
    pub const LOAD_RANGE: RangeInclusive<f64> = 0.0..=100.0;

    pub fn new(voltage: f64, frequency: f64, load: f64) -> Self {
        Self {
            voltage,
            frequency,
            load,
        }
    }

    /// Rejects values outside the domain the grid model was tuned for
    pub fn validate(&self) -> Result<(), AssessError> {
        let fields = [
            ("voltage", self.voltage, Self::VOLTAGE_RANGE),
            ("frequency", self.frequency, Self::FREQUENCY_RANGE),
            ("load", self.load, Self::LOAD_RANGE),
        ];

        for (field, value, range) in fields {
            if !range.contains(&value) {
                return Err(AssessError::InputOutOfRange {
                    field,
                    value,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }

        Ok(())
    }
}

/// What to report when no rule fires for a reading
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Surface [`FuzzyError::NoRuleFired`]
    #[default]
    Fail,
    /// Report Low severity without a score
    AssumeLow,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// `None` when the Low fallback was applied
    pub severity_score: Option<f64>,
    pub severity_level: SeverityLevel,
    pub suggested_action: Action,
}

impl Assessment {
    pub fn from_score(score: f64, bands: &SeverityBands) -> Self {
        let severity_level = bands.classify(score);

        Self {
            severity_score: Some(score),
            severity_level,
            suggested_action: severity_level.action(),
        }
    }
}

/// Validates readings, scores them with the shared grid model and
/// classifies the score.
#[derive(Clone, Debug)]
pub struct Assessor {
    model: GridModel,
    bands: SeverityBands,
    fallback: Fallback,
}

impl Assessor {
    pub fn new(model: GridModel, bands: SeverityBands, fallback: Fallback) -> Result<Self, AssessError> {
        bands.validate()?;

        Ok(Self { model, bands, fallback })
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    pub fn bands(&self) -> SeverityBands {
        self.bands
    }

    pub fn assess(&self, reading: &Reading) -> Result<Assessment, AssessError> {
        reading.validate()?;

        match self.model.severity(reading) {
            Ok(score) => {
                let assessment = Assessment::from_score(score, &self.bands);

                debug!(
                    voltage = reading.voltage,
                    frequency = reading.frequency,
                    load = reading.load,
                    score,
                    level = %assessment.severity_level,
                    "assessed reading"
                );

                Ok(assessment)
            },
            Err(FuzzyError::NoRuleFired { variable }) if self.fallback == Fallback::AssumeLow => {
                warn!(?reading, %variable, "no rule fired, assuming low severity");

                Ok(Assessment {
                    severity_score: None,
                    severity_level: SeverityLevel::Low,
                    suggested_action: Action::NoAction,
                })
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Request handler: a JSON object with `voltage`, `frequency` and `load`
    /// in, the serialized [`Assessment`] out.
    pub fn detect(&self, request: &str) -> Result<String, AssessError> {
        let reading: Reading = serde_json::from_str(request)?;
        let assessment = self.assess(&reading)?;

        Ok(serde_json::to_string(&assessment)?)
    }
}

#[test]
fn test_bands_classify() {
    let service = SeverityBands::SERVICE;
    let console = SeverityBands::CONSOLE;

    assert_eq!(service.classify(0.), SeverityLevel::Low);
    assert_eq!(service.classify(29.999), SeverityLevel::Low);
    assert_eq!(service.classify(30.), SeverityLevel::Moderate);
    assert_eq!(service.classify(59.9), SeverityLevel::Moderate);
    assert_eq!(service.classify(60.), SeverityLevel::High);
    assert_eq!(console.classify(65.), SeverityLevel::Moderate);
    assert_eq!(console.classify(70.), SeverityLevel::High);
    assert_eq!(SeverityBands::default(), service);
}

#[test]
fn test_bands_validation() {
    assert!(SeverityBands::new(30., 70.).is_ok());
    assert!(matches!(
        SeverityBands::new(60., 30.),
        Err(AssessError::InvalidBands { .. })
    ));
    assert!(SeverityBands::new(f64::NAN, 30.).is_err());
}

#[test]
fn test_levels_map_to_actions() {
    assert_eq!(SeverityLevel::Low.action().to_string(), "No Action Required");
    assert_eq!(
        SeverityLevel::Moderate.action().to_string(),
        "Activate Load Balancing and Monitoring"
    );
    assert_eq!(
        SeverityLevel::High.action().to_string(),
        "Immediate Isolation and Load Rerouting"
    );
    assert_eq!(SeverityLevel::High.to_string(), "High Severity");
}

#[test]
fn test_reading_validation() {
    assert!(Reading::new(20., 2., 100.).validate().is_ok());
    assert!(Reading::new(0., 0., 0.).validate().is_ok());

    match Reading::new(21., 1., 50.).validate() {
        Err(AssessError::InputOutOfRange { field, value, .. }) => {
            assert_eq!(field, "voltage");
            assert_eq!(value, 21.);
        },
        other => panic!("unexpected {other:?}"),
    }

    assert!(Reading::new(1., -0.1, 50.).validate().is_err());
    assert!(Reading::new(1., 1., f64::NAN).validate().is_err());
}

#[test]
fn test_detect_round_trip() {
    let assessor = Assessor::new(GridModel::new().unwrap(), SeverityBands::SERVICE, Fallback::Fail).unwrap();
    let response = assessor
        .detect(r#"{"voltage": 10, "frequency": 0.7, "load": 50}"#)
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&response).unwrap();

    assert_eq!(json["severity_score"], 50.0);
    assert_eq!(json["severity_level"], "Moderate Severity");
    assert_eq!(json["severity_level"], SeverityLevel::Moderate.label());
    assert_eq!(json["suggested_action"], "Activate Load Balancing and Monitoring");
    assert!(matches!(
        assessor.detect(r#"{"voltage": "high"}"#),
        Err(AssessError::Request(_))
    ));
}

#[test]
fn test_fallback_policy() {
    // Medium voltage alongside unstable frequency and unbalanced load matches no rule
    let reading = Reading::new(10., 2., 100.);
    let strict = Assessor::new(GridModel::new().unwrap(), SeverityBands::SERVICE, Fallback::Fail).unwrap();

    assert!(matches!(
        strict.assess(&reading),
        Err(AssessError::Inference(FuzzyError::NoRuleFired { .. }))
    ));

    let lenient = Assessor::new(GridModel::new().unwrap(), SeverityBands::SERVICE, Fallback::AssumeLow).unwrap();
    let assessment = lenient.assess(&reading).unwrap();

    assert_eq!(assessment.severity_score, None);
    assert_eq!(assessment.severity_level, SeverityLevel::Low);
    assert_eq!(assessment.suggested_action, Action::NoAction);
}

//! GPU failure prediction signal and its label mapping

use std::fmt;

use tracing::debug;

use crate::labels::PREDICTION_VALUE_LABEL;
use crate::source::TimeSeries;

/// Label value for nodes fit for large training workloads
pub const RECOMMENDED: &str = "True";

/// Label value for nodes expected to degrade
pub const NOT_RECOMMENDED: &str = "False";

/// Prediction reported by the failure prediction metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionSignal {
    /// NO_DEGRADATION_PREDICTED
    NoDegradation,
    /// POSSIBLE_DEGRADATION_PREDICTED
    PossibleDegradation,
    /// DEGRADATION_PREDICTED
    Degradation,
    /// Any other value, kept verbatim
    Unrecognized(String),
}

impl PredictionSignal {
    /// Classify a raw metric label value
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "NO_DEGRADATION_PREDICTED" => PredictionSignal::NoDegradation,
            "POSSIBLE_DEGRADATION_PREDICTED" => PredictionSignal::PossibleDegradation,
            "DEGRADATION_PREDICTED" => PredictionSignal::Degradation,
            other => PredictionSignal::Unrecognized(other.to_string()),
        }
    }

    /// Recommendation label value, or `None` when the signal must not be written
    pub fn label_value(&self) -> Option<&'static str> {
        match self {
            PredictionSignal::NoDegradation | PredictionSignal::PossibleDegradation => {
                Some(RECOMMENDED)
            }
            PredictionSignal::Degradation => Some(NOT_RECOMMENDED),
            PredictionSignal::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for PredictionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionSignal::NoDegradation => write!(f, "NO_DEGRADATION_PREDICTED"),
            PredictionSignal::PossibleDegradation => write!(f, "POSSIBLE_DEGRADATION_PREDICTED"),
            PredictionSignal::Degradation => write!(f, "DEGRADATION_PREDICTED"),
            PredictionSignal::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

/// Signal of the first series carrying a non-empty prediction value
///
/// Series are scanned in the order given; later series are ignored once a
/// value is found.
pub fn first_prediction(series: &[TimeSeries]) -> Option<PredictionSignal> {
    for (index, s) in series.iter().enumerate() {
        match s.label(PREDICTION_VALUE_LABEL).filter(|v| !v.is_empty()) {
            Some(raw) => return Some(PredictionSignal::from_raw(raw)),
            None => debug!(series = index, "Series has no prediction value label"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::FAILURE_PREDICTION_METRIC;

    fn series(value: Option<&str>) -> TimeSeries {
        match value {
            Some(v) => TimeSeries::with_labels(FAILURE_PREDICTION_METRIC, [("Value", v)]),
            None => TimeSeries::with_labels(FAILURE_PREDICTION_METRIC, [("gpu", "0")]),
        }
    }

    #[test]
    fn test_label_value_mapping() {
        assert_eq!(
            PredictionSignal::from_raw("NO_DEGRADATION_PREDICTED").label_value(),
            Some("True")
        );
        assert_eq!(
            PredictionSignal::from_raw("POSSIBLE_DEGRADATION_PREDICTED").label_value(),
            Some("True")
        );
        assert_eq!(
            PredictionSignal::from_raw("DEGRADATION_PREDICTED").label_value(),
            Some("False")
        );
    }

    #[test]
    fn test_unrecognized_has_no_label() {
        for raw in ["UNKNOWN", "degradation_predicted", "DEGRADATION_PREDICTED "] {
            let signal = PredictionSignal::from_raw(raw);
            assert_eq!(signal, PredictionSignal::Unrecognized(raw.to_string()));
            assert_eq!(signal.label_value(), None);
            assert_eq!(signal.to_string(), raw);
        }
    }

    #[test]
    fn test_first_prediction_wins() {
        let found = first_prediction(&[
            series(Some("DEGRADATION_PREDICTED")),
            series(Some("NO_DEGRADATION_PREDICTED")),
            series(Some("POSSIBLE_DEGRADATION_PREDICTED")),
        ]);
        assert_eq!(found, Some(PredictionSignal::Degradation));
        assert_eq!(found.and_then(|s| s.label_value()), Some("False"));
    }

    #[test]
    fn test_first_prediction_skips_series_without_value() {
        let found = first_prediction(&[
            series(None),
            series(Some("")),
            series(Some("POSSIBLE_DEGRADATION_PREDICTED")),
        ]);
        assert_eq!(found, Some(PredictionSignal::PossibleDegradation));
    }

    #[test]
    fn test_first_prediction_none() {
        assert_eq!(first_prediction(&[]), None);
        assert_eq!(first_prediction(&[series(None), series(None)]), None);
    }
}

//! Splice historical prices and a forecast point into chart datasets.
//!
//! With a prediction the label axis grows by one. The historical dataset is
//! left exactly as received; the prediction dataset is aligned to the longer
//! axis and is empty except for two points: the last historical price (the
//! join anchor) and the predicted price. A renderer therefore draws an
//! unbroken historical curve and a separate forecast segment that starts
//! where the curve ends.

use super::{
    ChartSeries, Dataset, DatasetKind, DatasetStyle, HISTORICAL_LABEL, PREDICTION_LABEL,
    TrendError,
};

/// Series with a single historical dataset and no forecast overlay.
pub fn compose_historical(labels: &[String], prices: &[f64]) -> Result<ChartSeries, TrendError> {
    check_lengths(labels, prices)?;

    Ok(ChartSeries {
        labels: labels.to_vec(),
        datasets: vec![historical_dataset(prices)],
    })
}

/// Series with the historical dataset plus a forecast segment.
///
/// `prediction_label` must sort after the last historical label; that is
/// trusted, not checked.
pub fn compose_with_prediction(
    labels: &[String],
    prices: &[f64],
    prediction_label: &str,
    prediction_price: f64,
) -> Result<ChartSeries, TrendError> {
    check_lengths(labels, prices)?;
    let &last_price = prices.last().ok_or(TrendError::EmptyHistory)?;

    let mut axis = Vec::with_capacity(labels.len() + 1);
    axis.extend_from_slice(labels);
    axis.push(prediction_label.to_string());

    let mut forecast = vec![None; prices.len() - 1];
    forecast.push(Some(last_price));
    forecast.push(Some(prediction_price));

    Ok(ChartSeries {
        labels: axis,
        datasets: vec![
            historical_dataset(prices),
            Dataset {
                kind: DatasetKind::Prediction,
                label: PREDICTION_LABEL.to_string(),
                data: forecast,
                style: DatasetStyle::prediction(),
            },
        ],
    })
}

fn check_lengths(labels: &[String], prices: &[f64]) -> Result<(), TrendError> {
    if labels.len() != prices.len() {
        return Err(TrendError::LengthMismatch {
            labels: labels.len(),
            prices: prices.len(),
        });
    }
    Ok(())
}

fn historical_dataset(prices: &[f64]) -> Dataset {
    Dataset {
        kind: DatasetKind::Historical,
        label: HISTORICAL_LABEL.to_string(),
        data: prices.iter().copied().map(Some).collect(),
        style: DatasetStyle::historical(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn historical_keeps_data_unchanged() {
        let series = compose_historical(&labels(&["d1", "d2", "d3"]), &[10.0, 12.5, 11.0]).unwrap();
        assert_eq!(series.labels, labels(&["d1", "d2", "d3"]));
        assert_eq!(series.datasets.len(), 1);
        assert_eq!(
            series.datasets[0].data,
            vec![Some(10.0), Some(12.5), Some(11.0)]
        );
        assert!(!series.has_prediction());
    }

    #[test]
    fn historical_rejects_length_mismatch() {
        let err = compose_historical(&labels(&["d1", "d2", "d3"]), &[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            TrendError::LengthMismatch {
                labels: 3,
                prices: 2
            }
        );
    }

    #[test]
    fn historical_accepts_empty_series() {
        let series = compose_historical(&[], &[]).unwrap();
        assert!(series.labels.is_empty());
        assert!(series.datasets[0].data.is_empty());
    }

    #[test]
    fn prediction_joins_at_last_historical_point() {
        let series =
            compose_with_prediction(&labels(&["d1", "d2"]), &[10.0, 20.0], "d3", 25.0).unwrap();

        assert_eq!(series.labels, labels(&["d1", "d2", "d3"]));
        let hist = series.dataset(DatasetKind::Historical).unwrap();
        assert_eq!(hist.data, vec![Some(10.0), Some(20.0)]);
        let pred = series.dataset(DatasetKind::Prediction).unwrap();
        assert_eq!(pred.data, vec![None, Some(20.0), Some(25.0)]);
    }

    #[test]
    fn prediction_dataset_spans_the_extended_axis() {
        let series = compose_with_prediction(
            &labels(&["d1", "d2", "d3", "d4"]),
            &[1.0, 2.0, 3.0, 4.0],
            "d5",
            9.0,
        )
        .unwrap();
        let pred = series.dataset(DatasetKind::Prediction).unwrap();
        assert_eq!(pred.data.len(), series.labels.len());
        assert_eq!(pred.data.iter().filter(|v| v.is_some()).count(), 2);
        assert_eq!(pred.style.border_dash, vec![5, 5]);
    }

    #[test]
    fn prediction_with_single_point_history() {
        let series = compose_with_prediction(&labels(&["d1"]), &[7.0], "d2", 8.0).unwrap();
        let pred = series.dataset(DatasetKind::Prediction).unwrap();
        assert_eq!(pred.data, vec![Some(7.0), Some(8.0)]);
    }

    #[test]
    fn prediction_requires_history() {
        let err = compose_with_prediction(&[], &[], "d1", 1.0).unwrap_err();
        assert_eq!(err, TrendError::EmptyHistory);
    }

    #[test]
    fn prediction_rejects_length_mismatch() {
        let err = compose_with_prediction(&labels(&["d1"]), &[1.0, 2.0], "d3", 3.0).unwrap_err();
        assert!(matches!(err, TrendError::LengthMismatch { .. }));
    }

    #[test]
    fn series_serializes_gaps_as_null() {
        let series = compose_with_prediction(&labels(&["d1", "d2"]), &[10.0, 20.0], "d3", 25.0).unwrap();
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["datasets"][1]["data"], serde_json::json!([null, 20.0, 25.0]));
        assert_eq!(json["datasets"][1]["kind"], "prediction");
    }
}

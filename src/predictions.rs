use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::models::{ObjectCount, Prediction};

/// Keep predictions whose score is at or above `threshold`, in input order.
///
/// The returned iterator is lazy. Any threshold is accepted; values outside
/// [0, 1] simply select everything or nothing.
pub fn over_threshold<I>(predictions: I, threshold: f32) -> impl Iterator<Item = I::Item>
where
    I: IntoIterator,
    I::Item: Borrow<Prediction>,
{
    predictions
        .into_iter()
        .filter(move |p| {
            let p: &Prediction = p.borrow();
            p.score >= threshold
        })
}

/// Tally predictions per class name. One entry per distinct class.
pub fn count<I>(predictions: I) -> Vec<ObjectCount>
where
    I: IntoIterator,
    I::Item: Borrow<Prediction>,
{
    let mut tally: BTreeMap<String, u64> = BTreeMap::new();
    for prediction in predictions {
        let prediction: &Prediction = prediction.borrow();
        match tally.get_mut(&prediction.class_name) {
            Some(n) => *n += 1,
            None => {
                tally.insert(prediction.class_name.clone(), 1);
            }
        }
    }
    tally
        .into_iter()
        .map(|(object_class, count)| ObjectCount { object_class, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn prediction(class_name: &str, score: f32) -> Prediction {
        Prediction {
            class_name: class_name.to_string(),
            score,
            bbox: BoundingBox {
                xmin: 0.0,
                ymin: 0.0,
                xmax: 1.0,
                ymax: 1.0,
            },
        }
    }

    #[test]
    fn test_filter_keeps_scores_at_or_above_threshold() {
        let cases = [
            (
                vec![prediction("dog", 0.9), prediction("cat", 0.8)],
                0.9,
                vec![prediction("dog", 0.9)],
            ),
            (
                vec![prediction("cat", 0.91), prediction("cat", 0.8)],
                0.85,
                vec![prediction("cat", 0.91)],
            ),
        ];
        for (predictions, threshold, expected) in cases {
            let filtered: Vec<Prediction> = over_threshold(predictions, threshold).collect();
            assert_eq!(filtered, expected);
        }
    }

    #[test]
    fn test_filter_preserves_order_and_is_idempotent() {
        let predictions = vec![
            prediction("a", 0.7),
            prediction("b", 0.2),
            prediction("c", 0.5),
            prediction("d", 0.9),
        ];
        let once: Vec<&Prediction> = over_threshold(&predictions, 0.5).collect();
        let names: Vec<&str> = once.iter().map(|p| p.class_name.as_str()).collect();
        assert_eq!(names, ["a", "c", "d"]);

        let twice: Vec<&Prediction> = over_threshold(once.iter().copied(), 0.5).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_out_of_range_thresholds() {
        let predictions = vec![prediction("a", 0.0), prediction("b", 1.0)];
        assert_eq!(over_threshold(&predictions, -1.0).count(), 2);
        assert_eq!(over_threshold(&predictions, 1.5).count(), 0);
        assert_eq!(over_threshold(Vec::<Prediction>::new(), 0.5).count(), 0);
    }

    #[test]
    fn test_filter_is_lazy_and_restartable() {
        let predictions = vec![prediction("a", 0.6), prediction("b", 0.4)];
        let mut iter = over_threshold(&predictions, 0.5);
        assert_eq!(iter.next().map(|p| p.class_name.as_str()), Some("a"));
        assert!(iter.next().is_none());
        assert_eq!(over_threshold(&predictions, 0.5).count(), 1);
    }

    #[test]
    fn test_count_predictions_by_class() {
        let predictions = vec![prediction("cat", 0.5), prediction("cat", 0.5), prediction("dog", 0.5)];
        let mut counts = count(&predictions);
        counts.sort_by(|a, b| a.object_class.cmp(&b.object_class));
        assert_eq!(counts, vec![ObjectCount::new("cat", 2), ObjectCount::new("dog", 1)]);
        assert_eq!(counts.iter().map(|c| c.count).sum::<u64>(), predictions.len() as u64);
    }

    #[test]
    fn test_count_empty() {
        assert!(count(Vec::<Prediction>::new()).is_empty());
    }
}

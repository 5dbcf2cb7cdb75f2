//! Area under the ROC curve.

use ndarray::Array2;

/// Mann-Whitney AUC of `scores` for the positives marked in `positive`.
///
/// Tied scores receive their average rank. Returns `None` unless both
/// positives and negatives are present.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub fn roc_auc(scores: &[f64], positive: &[bool]) -> Option<f64> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 || scores.len() != positive.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum = 0.0_f64;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based: the tie group spans ranks start+1 ..= end
        let average_rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            if positive[i] {
                rank_sum += average_rank;
            }
        }
        start = end;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// AUC of one class against the rest, from class probabilities.
pub fn class_auc(proba: &Array2<f64>, labels: &[usize], class: usize) -> Option<f64> {
    if class >= proba.ncols() {
        return None;
    }
    let scores: Vec<f64> = proba.column(class).to_vec();
    let positive: Vec<bool> = labels.iter().map(|&l| l == class).collect();
    roc_auc(&scores, &positive)
}

/// Selection score for a probability matrix.
///
/// With two classes this is the AUC of class 0 (the positive class of the
/// binary view); otherwise the mean one-vs-rest AUC over classes for which
/// it is defined.
#[allow(clippy::cast_precision_loss)]
pub fn auc_score(proba: &Array2<f64>, labels: &[usize]) -> Option<f64> {
    let n_classes = proba.ncols();
    if n_classes == 2 {
        return class_auc(proba, labels, 0);
    }

    let per_class: Vec<f64> = (0..n_classes)
        .filter_map(|class| class_auc(proba, labels, class))
        .collect();
    if per_class.is_empty() {
        None
    } else {
        Some(per_class.iter().sum::<f64>() / per_class.len() as f64)
    }
}

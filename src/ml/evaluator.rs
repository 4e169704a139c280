// ============================================================
// Layer 5 — Evaluator
// ============================================================
// One sequential pass over a dataset without touching parameters.
//
// Call it with an inference-mode model (`model.valid()` on the
// inner backend, or any model on a non-autodiff backend): Burn
// then disables dropout and batch norm uses its running stats.
//
// Loss is summed per batch and divided by the total sample count
// at the end, so the result does not depend on how the dataset is
// cut into batches.

use std::sync::Arc;

use burn::{
    data::dataloader::DataLoaderBuilder,
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::data::{
    batcher::{ClipBatch, ClipBatcher},
    dataset::ClipDataset,
};
use crate::ml::model::ActionClassifier;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Mean cross-entropy per sample
    pub loss: f64,
    /// Fraction of arg-max predictions equal to the label
    pub accuracy: f64,
    pub samples: usize,
}

/// Summed cross-entropy of a batch: -Σ log_softmax(logits)[label]
pub fn summed_cross_entropy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let [n, _] = logits.dims();
    log_softmax(logits, 1)
        .gather(1, labels.reshape([n, 1]))
        .sum()
        .neg()
}

pub fn evaluate<B, M>(
    model:      &M,
    dataset:    Arc<ClipDataset>,
    batcher:    ClipBatcher<B>,
    batch_size: usize,
) -> Evaluation
where
    B: Backend,
    M: ActionClassifier<B>,
{
    let loader = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size.max(1))
        .build(dataset);

    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let ClipBatch { frames, flow, labels } = batch;
        let [n] = labels.dims();
        let logits = model.classify(frames, flow);

        loss_sum += summed_cross_entropy(logits.clone(), labels.clone())
            .into_scalar()
            .elem::<f64>();

        // argmax(1) returns shape [batch, 1]; flatten to [batch]
        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted
            .equal(labels)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        correct += hits as usize;
        total   += n;
    }

    if total == 0 {
        return Evaluation { loss: f64::NAN, accuracy: 0.0, samples: 0 };
    }

    Evaluation {
        loss:     loss_sum / total as f64,
        accuracy: correct as f64 / total as f64,
        samples:  total,
    }
}

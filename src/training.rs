use crate::data::{VectorBatch, VectorBatcher, VectorItem};
use crate::error::MlpError;
use crate::mlp::{Mlp, MlpConfig};
use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::data::dataset::Dataset;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

#[derive(Config)]
pub struct TrainingConfig {
    /// Plain gradient descent at a fixed learning rate.
    pub optimizer: SgdConfig,
    #[config(default = 4)]
    pub num_epochs: usize,
    #[config(default = 32)]
    pub batch_size: usize,
    #[config(default = 1)]
    pub num_workers: usize,
    #[config(default = 1e-3)]
    pub lr: f64,
    #[config(default = 0)]
    pub seed: u64,
}

/// The trained model plus the mean loss observed for each epoch, in order.
#[derive(Debug)]
pub struct TrainOutcome<B: Backend> {
    pub model: Mlp<B>,
    pub epoch_losses: Vec<f64>,
}

/// Loss and accuracy over a full split.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOutcome {
    pub mean_loss: f64,
    pub accuracy: f64,
}

type Dataloader<B> = std::sync::Arc<dyn DataLoader<B, VectorBatch<B>> + 'static>;

/// Trains a freshly initialized model over the dataset for the configured
/// number of epochs.
///
/// Each step runs forward, cross-entropy loss, reverse-mode backward, then
/// one optimizer step at the fixed learning rate. Gradients are created
/// fresh by every `backward()` call and consumed whole by the step, so they
/// never carry over between batches. A batch whose feature width disagrees
/// with the model input size aborts training immediately.
pub fn train<AutoB, D>(
    config: &TrainingConfig,
    model_config: &MlpConfig,
    dataset: D,
    device: AutoB::Device,
) -> Result<TrainOutcome<AutoB>, MlpError>
where
    AutoB: AutodiffBackend,
    D: Dataset<VectorItem> + 'static,
{
    AutoB::seed(config.seed);

    let mut model: Mlp<AutoB> = model_config.init(&device);
    let mut optim = config.optimizer.init::<AutoB, Mlp<AutoB>>();
    log::info!(
        "training {} parameters for {} epochs (lr {})",
        model.num_params(),
        config.num_epochs,
        config.lr
    );

    let dataloader: Dataloader<AutoB> = DataLoaderBuilder::new(VectorBatcher::default())
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(dataset);

    let loss_fn = CrossEntropyLossConfig::new().init(&device);
    let mut epoch_losses = Vec::with_capacity(config.num_epochs);

    for epoch in 1..config.num_epochs + 1 {
        let mut loss_sum = 0.0;
        let mut items_seen = 0usize;

        for (b, batch) in dataloader.iter().enumerate() {
            let [batch_size, features] = batch.inputs.dims();
            if features != model.input_size() {
                return Err(MlpError::InputShape {
                    expected: model.input_size(),
                    found: features,
                });
            }

            let logits = model.forward(batch.inputs);
            let loss = loss_fn.forward(logits, batch.targets);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(config.lr, model, grads);

            let batch_loss = loss.into_scalar().elem::<f64>();
            loss_sum += batch_loss * batch_size as f64;
            items_seen += batch_size;
            log::debug!(
                "epoch {epoch}/{}, batch {:0>4}, loss {batch_loss:.4}",
                config.num_epochs,
                b + 1,
            );
        }

        let mean_loss = if items_seen == 0 {
            0.0
        } else {
            loss_sum / items_seen as f64
        };
        log::info!(
            "epoch {epoch}/{}, mean loss {mean_loss:.4}",
            config.num_epochs
        );
        epoch_losses.push(mean_loss);
    }

    Ok(TrainOutcome {
        model,
        epoch_losses,
    })
}

/// Runs the model over a split without touching its parameters and reports
/// mean loss and accuracy.
pub fn evaluate<B, D>(
    model: &Mlp<B>,
    dataset: D,
    batch_size: usize,
    device: B::Device,
) -> Result<EvalOutcome, MlpError>
where
    B: Backend,
    D: Dataset<VectorItem> + 'static,
{
    let dataloader: Dataloader<B> = DataLoaderBuilder::new(VectorBatcher::default())
        .batch_size(batch_size)
        .build(dataset);

    let loss_fn = CrossEntropyLossConfig::new().init(&device);
    let mut loss_sum = 0.0;
    let mut correct = 0.0;
    let mut items_seen = 0usize;

    for batch in dataloader.iter() {
        let [batch_size, features] = batch.inputs.dims();
        if features != model.input_size() {
            return Err(MlpError::InputShape {
                expected: model.input_size(),
                found: features,
            });
        }

        let logits = model.forward(batch.inputs);
        let loss = loss_fn.forward(logits.clone(), batch.targets.clone());

        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        correct += predicted
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<f64>();

        loss_sum += loss.into_scalar().elem::<f64>() * batch_size as f64;
        items_seen += batch_size;
    }

    if items_seen == 0 {
        return Ok(EvalOutcome {
            mean_loss: 0.0,
            accuracy: 0.0,
        });
    }

    Ok(EvalOutcome {
        mean_loss: loss_sum / items_seen as f64,
        accuracy: correct / items_seen as f64,
    })
}

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// One labeled sample: a flat feature vector and its class.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VectorItem {
    /// Flattened input features.
    pub features: Vec<f32>,

    /// Class label.
    pub label: u8,
}

#[derive(Clone, Default, Debug)]
pub struct VectorBatcher {}

#[derive(Clone, Debug)]
pub struct VectorBatch<B: Backend> {
    /// # Shape
    /// [batch_size, features]
    pub inputs: Tensor<B, 2>,
    /// # Shape
    /// [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> Batcher<B, VectorItem, VectorBatch<B>> for VectorBatcher {
    fn batch(&self, items: Vec<VectorItem>, device: &B::Device) -> VectorBatch<B> {
        let (items_features, items_label): (Vec<_>, Vec<_>) = items
            .into_iter()
            .map(|item| (item.features, item.label))
            .unzip();

        let inputs = items_features
            .into_iter()
            .map(|features| {
                let width = features.len();
                TensorData::new(features, [1, width]).convert::<B::FloatElem>()
            })
            .map(|data| Tensor::<B, 2>::from_data(data, device))
            .collect();

        let targets = items_label
            .into_iter()
            .map(|label| {
                Tensor::<B, 1, Int>::from_data([(label as i64).elem::<B::IntElem>()], device)
            })
            .collect();

        VectorBatch {
            inputs: Tensor::cat(inputs, 0),
            targets: Tensor::cat(targets, 0),
        }
    }
}

/// Deterministic synthetic classification data.
///
/// Each class gets a fixed axis-aligned center in feature space; samples are
/// that center plus uniform noise from a seeded generator, so the same seed
/// always yields the same items in the same order.
pub struct SyntheticDataset {
    items: Vec<VectorItem>,
}

impl SyntheticDataset {
    pub fn new(
        num_items: usize,
        num_features: usize,
        num_classes: usize,
        noise_level: f32,
        seed: u64,
    ) -> Self {
        assert!(num_classes > 0 && num_classes <= u8::MAX as usize + 1);
        let mut rng = StdRng::seed_from_u64(seed);

        let items = (0..num_items)
            .map(|i| {
                let label = (i % num_classes) as u8;
                let features = (0..num_features)
                    .map(|j| {
                        let center = if j % num_classes == label as usize {
                            1.0
                        } else {
                            0.0
                        };
                        center + noise_level * (rng.random::<f32>() - 0.5)
                    })
                    .collect();
                VectorItem { features, label }
            })
            .collect();

        Self { items }
    }
}

impl Dataset<VectorItem> for SyntheticDataset {
    fn get(&self, index: usize) -> Option<VectorItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

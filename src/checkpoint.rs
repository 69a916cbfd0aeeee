//! Single-file model snapshots.
//!
//! A checkpoint is one MessagePack record holding the architecture
//! descriptor (input size, hidden widths, output size) and every parameter
//! value by name. Loading reconstructs a fresh model from the descriptor and
//! refuses to proceed unless every stored shape matches it exactly.

use crate::error::MlpError;
use crate::mlp::{Mlp, MlpConfig};
use burn::module::Param;
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Persisted record: architecture descriptor plus named parameter values.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Snapshot {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_layers: Vec<usize>,
    pub parameters: Vec<ParameterEntry>,
}

/// One parameter's values, stored as f32 with its shape.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ParameterEntry {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

impl Snapshot {
    /// Captures the model's architecture and current parameter values.
    pub fn from_model<B: Backend>(model: &Mlp<B>) -> Result<Self, MlpError> {
        let mut parameters = Vec::new();
        for (name, data) in model.named_parameters() {
            let shape = data.shape.clone();
            let values = data
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|err| MlpError::TensorData(format!("{err:?}")))?;
            parameters.push(ParameterEntry {
                name,
                shape,
                values,
            });
        }

        Ok(Self {
            input_size: model.input_size(),
            output_size: model.output_size(),
            hidden_layers: model.hidden_layers(),
            parameters,
        })
    }

    /// Rebuilds the model this snapshot describes.
    ///
    /// Every stored shape is validated against the freshly constructed
    /// architecture before any value is assigned; a mismatch anywhere fails
    /// the load as a whole.
    pub fn into_model<B: Backend>(self, device: &B::Device) -> Result<Mlp<B>, MlpError> {
        let config = MlpConfig::new(self.input_size, self.output_size)
            .with_hidden_layers(self.hidden_layers.clone());
        let mut model: Mlp<B> = config.init(device);

        let mut entries: HashMap<String, ParameterEntry> = self
            .parameters
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();

        let expected = model.named_parameters();
        for (name, data) in &expected {
            let entry = entries
                .get(name)
                .ok_or_else(|| MlpError::MissingParameter { name: name.clone() })?;
            if entry.shape != data.shape {
                return Err(MlpError::ShapeMismatch {
                    name: name.clone(),
                    expected: data.shape.clone(),
                    stored: entry.shape.clone(),
                });
            }
        }
        if entries.len() != expected.len() {
            let known: HashSet<&String> = expected.iter().map(|(name, _)| name).collect();
            let name = entries
                .keys()
                .find(|name| !known.contains(name))
                .cloned()
                .unwrap_or_default();
            return Err(MlpError::UnknownParameter { name });
        }

        for (i, layer) in model.layers.iter_mut().enumerate() {
            let weight = restore::<B, 2>(&mut entries, &format!("layers.{i}.weight"), device)?;
            layer.weight = Param::from_tensor(weight);
            if layer.bias.is_some() {
                let bias = restore::<B, 1>(&mut entries, &format!("layers.{i}.bias"), device)?;
                layer.bias = Some(Param::from_tensor(bias));
            }
        }

        Ok(model)
    }
}

fn restore<B: Backend, const D: usize>(
    entries: &mut HashMap<String, ParameterEntry>,
    name: &str,
    device: &B::Device,
) -> Result<Tensor<B, D>, MlpError> {
    let entry = entries
        .remove(name)
        .ok_or_else(|| MlpError::MissingParameter {
            name: name.to_string(),
        })?;
    let data = TensorData::new(entry.values, entry.shape).convert::<B::FloatElem>();
    Ok(Tensor::from_data(data, device))
}

/// Writes the model's architecture and current parameter values to `path`.
///
/// The record is written to a temporary sibling first and renamed into
/// place, so an interrupted save never leaves a truncated checkpoint behind.
pub fn save<B: Backend>(model: &Mlp<B>, path: &Path) -> Result<(), MlpError> {
    let snapshot = Snapshot::from_model(model)?;
    let bytes = rmp_serde::to_vec_named(&snapshot)?;

    let tmp = path.with_added_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    log::info!("saved checkpoint to {path:?} ({} bytes)", bytes.len());

    Ok(())
}

/// Reads a checkpoint and reconstructs the model it describes.
pub fn load<B: Backend>(path: &Path, device: &B::Device) -> Result<Mlp<B>, MlpError> {
    let bytes = fs::read(path)?;
    let snapshot: Snapshot = rmp_serde::from_slice(&bytes)?;
    log::info!(
        "loading checkpoint from {path:?}: {} -> {:?} -> {}",
        snapshot.input_size,
        snapshot.hidden_layers,
        snapshot.output_size
    );
    snapshot.into_model(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    type TB = burn::backend::NdArray<f32>;

    fn sample_model(hidden: Vec<usize>) -> Mlp<TB> {
        let device = Default::default();
        MlpConfig::new(7, 4).with_hidden_layers(hidden).init(&device)
    }

    #[test]
    fn snapshot_roundtrip_preserves_values_exactly() {
        let device = Default::default();
        let model = sample_model(vec![5, 3]);

        let snapshot = Snapshot::from_model(&model).unwrap();
        let restored: Mlp<TB> = snapshot.into_model(&device).unwrap();

        for ((name, before), (_, after)) in model
            .named_parameters()
            .into_iter()
            .zip(restored.named_parameters())
        {
            assert_eq!(
                before.to_vec::<f32>().unwrap(),
                after.to_vec::<f32>().unwrap(),
                "parameter {name} changed across the roundtrip"
            );
        }
    }

    #[test]
    fn descriptor_and_values_must_agree() {
        let model = sample_model(vec![5]);
        let mut snapshot = Snapshot::from_model(&model).unwrap();
        // descriptor now claims a wider hidden layer than the stored values
        snapshot.hidden_layers = vec![6];

        let device = Default::default();
        let err = snapshot.into_model::<TB>(&device).unwrap_err();
        match err {
            MlpError::ShapeMismatch {
                name,
                expected,
                stored,
            } => {
                assert_eq!("layers.0.weight", name);
                assert_eq!(vec![7, 6], expected);
                assert_eq!(vec![7, 5], stored);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_parameter_is_rejected() {
        let model = sample_model(vec![5]);
        let mut snapshot = Snapshot::from_model(&model).unwrap();
        snapshot.parameters.remove(0);

        let device = Default::default();
        let err = snapshot.into_model::<TB>(&device).unwrap_err();
        assert!(matches!(err, MlpError::MissingParameter { .. }), "{err:?}");
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let model = sample_model(vec![]);
        let mut snapshot = Snapshot::from_model(&model).unwrap();
        snapshot.parameters.push(ParameterEntry {
            name: "layers.9.weight".into(),
            shape: vec![1, 1],
            values: vec![0.0],
        });

        let device = Default::default();
        let err = snapshot.into_model::<TB>(&device).unwrap_err();
        match err {
            MlpError::UnknownParameter { name } => assert_eq!("layers.9.weight", name),
            other => panic!("expected UnknownParameter, got {other:?}"),
        }
    }
}

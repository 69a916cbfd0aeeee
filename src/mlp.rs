use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Feed-forward classifier: a stack of [`Linear`] layers with ReLU between
/// them, none after the output layer. The output is raw logits, one per
/// class.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    /// Hidden layers followed by the output layer.
    pub layers: Vec<Linear<B>>,
    pub activation: Relu,
}

#[derive(Config, Debug)]
pub struct MlpConfig {
    /// Flattened feature count of one input sample.
    pub input_size: usize,

    /// Number of classes.
    pub output_size: usize,

    /// Widths of the hidden layers, in order. Empty means a single linear
    /// layer from input to output.
    #[config(default = "Vec::new()")]
    pub hidden_layers: Vec<usize>,
}

impl MlpConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let mut layers = Vec::with_capacity(self.hidden_layers.len() + 1);
        let mut d_in = self.input_size;
        for &width in &self.hidden_layers {
            layers.push(LinearConfig::new(d_in, width).with_bias(true).init(device));
            d_in = width;
        }
        layers.push(
            LinearConfig::new(d_in, self.output_size)
                .with_bias(true)
                .init(device),
        );

        Mlp {
            layers,
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> Mlp<B> {
    /// Feature count the model accepts, read back from the first weight.
    pub fn input_size(&self) -> usize {
        let [d_in, _] = self.layers[0].weight.dims();
        d_in
    }

    /// Class count, read back from the last weight.
    pub fn output_size(&self) -> usize {
        let [_, d_out] = self.layers[self.layers.len() - 1].weight.dims();
        d_out
    }

    /// Hidden layer widths, in order.
    pub fn hidden_layers(&self) -> Vec<usize> {
        self.layers[..self.layers.len() - 1]
            .iter()
            .map(|layer| {
                let [_, width] = layer.weight.dims();
                width
            })
            .collect()
    }

    /// The architecture descriptor this model was built from.
    pub fn config(&self) -> MlpConfig {
        MlpConfig::new(self.input_size(), self.output_size())
            .with_hidden_layers(self.hidden_layers())
    }

    /// # Shapes
    ///   - Input [batch, input_size]
    ///   - Output [batch, output_size]
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch_size, features] = input.dims();
        debug_assert_eq!(features, self.input_size());

        let last = self.layers.len() - 1;
        let mut x = input;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if i < last {
                x = self.activation.forward(x);
            }
        }
        debug_assert_eq!([batch_size, self.output_size()], x.dims());

        x
    }

    /// Current parameter values, keyed `layers.{i}.weight` / `layers.{i}.bias`
    /// in layer order. This naming is the checkpoint schema.
    pub fn named_parameters(&self) -> Vec<(String, TensorData)> {
        let mut parameters = Vec::with_capacity(self.layers.len() * 2);
        for (i, layer) in self.layers.iter().enumerate() {
            parameters.push((format!("layers.{i}.weight"), layer.weight.val().to_data()));
            if let Some(bias) = &layer.bias {
                parameters.push((format!("layers.{i}.bias"), bias.val().to_data()));
            }
        }
        parameters
    }
}

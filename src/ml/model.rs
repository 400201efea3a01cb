use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
};

// ─── Predictor ────────────────────────────────────────────────────────────────
/// Anything the trainer can fit with an MSE objective:
/// maps a [batch, in] tensor to a [batch, out] tensor
/// that is compared against the batch targets.
pub trait Predictor<B: Backend> {
    fn predict(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2>;
}

// ─── Feed-forward regressor ───────────────────────────────────────────────────
// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct AnnRegressorConfig {
    pub input_size:  usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl AnnRegressorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AnnRegressor<B> {
        AnnRegressor {
            fc1:  LinearConfig::new(self.input_size, self.hidden_size).init(device),
            relu: Relu::new(),
            fc2:  LinearConfig::new(self.hidden_size, self.output_size).init(device),
        }
    }
}

/// Two linear layers with a ReLU in between.
#[derive(Module, Debug)]
pub struct AnnRegressor<B: Backend> {
    pub fc1:  Linear<B>,
    pub relu: Relu,
    pub fc2:  Linear<B>,
}

impl<B: Backend> AnnRegressor<B> {
    /// inputs: [batch, input_size] → [batch, output_size]
    pub fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let out = self.fc1.forward(inputs);
        let out = self.relu.forward(out);
        self.fc2.forward(out)
    }
}

impl<B: Backend> Predictor<B> for AnnRegressor<B> {
    fn predict(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(inputs)
    }
}

// ─── Autoencoder ──────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct AutoencoderConfig {
    pub input_dim:  usize,
    pub latent_dim: usize,
    #[config(default = 5)]
    pub hidden_dim: usize,
}

impl AutoencoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Autoencoder<B> {
        Autoencoder {
            enc_in:     LinearConfig::new(self.input_dim, self.hidden_dim).init(device),
            enc_out:    LinearConfig::new(self.hidden_dim, self.latent_dim).init(device),
            dec_in:     LinearConfig::new(self.latent_dim, self.hidden_dim).init(device),
            dec_out:    LinearConfig::new(self.hidden_dim, self.input_dim).init(device),
            activation: Relu::new(),
        }
    }
}

/// input → hidden → latent (bottleneck) → hidden → input
#[derive(Module, Debug)]
pub struct Autoencoder<B: Backend> {
    pub enc_in:     Linear<B>,
    pub enc_out:    Linear<B>,
    pub dec_in:     Linear<B>,
    pub dec_out:    Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> Autoencoder<B> {
    /// [batch, input_dim] → [batch, latent_dim]
    pub fn encode(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.enc_in.forward(inputs));
        self.enc_out.forward(x)
    }

    /// [batch, latent_dim] → [batch, input_dim]
    pub fn decode(&self, latent: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.dec_in.forward(latent));
        self.dec_out.forward(x)
    }

    /// Returns (reconstruction, latent code).
    pub fn forward(&self, inputs: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let encoded = self.encode(inputs);
        let decoded = self.decode(encoded.clone());
        (decoded, encoded)
    }
}

impl<B: Backend> Predictor<B> for Autoencoder<B> {
    fn predict(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(inputs).0
    }
}

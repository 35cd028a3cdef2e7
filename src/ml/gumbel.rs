// ============================================================
// Layer 5 — Differentiable Token Selection (hard Gumbel-softmax)
// ============================================================
// Picking "the" token for the masked slot is an argmax, and an
// argmax has no gradient. The hard Gumbel-softmax keeps the
// discrete pick in the forward pass and borrows the gradient of
// a softmax in the backward pass:
//
//   g_i   = -ln(-ln u_i),  u_i ~ U(0, 1)
//   soft  = softmax((logits + g) / τ)
//   hard  = one_hot(argmax(soft))
//   out   = hard + (soft - detach(soft))
//
// Forward: soft - detach(soft) is exactly 0, so `out` is exactly
// the one-hot row. Backward: d out / d soft = identity.
//
// Noise is drawn host-side from a StdRng owned by the sampler, so a
// fixed seed reproduces the same selections on every backend.
//
// Reference: Jang et al. (2017), Maddison et al. (2017)

use burn::{prelude::*, tensor::activation::softmax};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::error::SubstitutionError;

#[derive(Config, Debug)]
pub struct GumbelConfig {
    /// Softmax temperature τ; lower is closer to argmax.
    #[config(default = 1.0)]
    pub temperature: f64,
    /// Fixed noise seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl GumbelConfig {
    pub fn init(&self) -> Result<GumbelSoftmax, SubstitutionError> {
        // The division runs in f32: the value must survive that cast
        // as a normal number, not round to 0 or a subnormal.
        if !(self.temperature > 0.0 && (self.temperature as f32).is_normal()) {
            return Err(SubstitutionError::InvalidTemperature(self.temperature));
        }
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Ok(GumbelSoftmax { temperature: self.temperature, rng })
    }
}

/// Stateful sampler: each call advances the noise stream.
#[derive(Debug, Clone)]
pub struct GumbelSoftmax {
    temperature: f64,
    rng:         StdRng,
}

impl GumbelSoftmax {
    /// logits: [batch, vocab] → straight-through one-hot rows [batch, vocab]
    pub fn sample<B: Backend>(&mut self, logits: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch_size, vocab_size] = logits.dims();
        let noise = self.noise::<B>(batch_size, vocab_size, &logits.device());

        let soft = softmax((logits + noise).div_scalar(self.temperature), 1);
        let hard = one_hot_argmax(soft.clone());
        hard + (soft.clone() - soft.detach())
    }

    fn noise<B: Backend>(&mut self, batch_size: usize, vocab_size: usize, device: &B::Device) -> Tensor<B, 2> {
        let noise: Vec<f32> = (0..batch_size * vocab_size)
            .map(|_| {
                // Open interval: u = 0 gives ln(0), u = 1 gives ln(-0).
                let u: f64 = self.rng.gen_range(f64::MIN_POSITIVE..1.0);
                -(-u.ln()).ln() as f32
            })
            .collect();
        Tensor::<B, 1>::from_floats(noise.as_slice(), device).reshape([batch_size, vocab_size])
    }
}

/// Exact one-hot of each row's argmax. Carries no gradient.
pub fn one_hot_argmax<B: Backend>(scores: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch_size, vocab_size] = scores.dims();
    let device = scores.device();

    let winners = scores.argmax(1).expand([batch_size, vocab_size]);
    let columns = Tensor::<B, 1, Int>::arange(0..vocab_size as i64, &device)
        .unsqueeze::<2>()
        .expand([batch_size, vocab_size]);

    columns.equal(winners).float()
}

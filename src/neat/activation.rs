use serde::{Deserialize, Serialize};

/// Closed set of activation functions. Tags are data, not behaviour: a node
/// gene carries one of these and the evaluator applies the matching pure
/// function, which keeps evaluation deterministic and genomes trivially
/// serializable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Identity,
    Sigmoid,
    Tanh,
    Relu,
    Step,
}

impl Activation {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            // leaky variant so gradients of evolution-tuned weights do not
            // dead-zone the negative half
            Activation::Relu => {
                if x > 0.0 {
                    x
                } else {
                    0.01 * x
                }
            }
            Activation::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn identity_passes_through() {
        assert_approx_eq!(Activation::Identity.apply(-2.5), -2.5);
    }

    #[test]
    fn sigmoid_at_zero() {
        assert_approx_eq!(Activation::Sigmoid.apply(0.0), 0.5);
    }

    #[test]
    fn relu_leaks_negative() {
        assert_approx_eq!(Activation::Relu.apply(-1.0), -0.01);
        assert_approx_eq!(Activation::Relu.apply(2.0), 2.0);
    }

    #[test]
    fn step_thresholds() {
        assert_approx_eq!(Activation::Step.apply(0.4), 1.0);
        assert_approx_eq!(Activation::Step.apply(-0.4), 0.0);
    }
}

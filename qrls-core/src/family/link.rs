//! Link functions for GLM families.
//!
//! Maps between the linear predictor (eta) and the mean (mu).

/// Link function interface.
pub trait LinkFunction {
    /// Apply the link function: eta = g(mu).
    fn link(&self, mu: f64) -> f64;
    /// Apply the inverse link: mu = g^{-1}(eta).
    fn inv_link(&self, eta: f64) -> f64;
    /// Derivative of the inverse link: d(mu)/d(eta).
    fn mu_eta(&self, eta: f64) -> f64;
}

/// Identity link: eta = mu.
#[derive(Debug, Clone, Copy)]
pub struct IdentityLink;

impl LinkFunction for IdentityLink {
    fn link(&self, mu: f64) -> f64 {
        mu
    }

    fn inv_link(&self, eta: f64) -> f64 {
        eta
    }

    fn mu_eta(&self, _eta: f64) -> f64 {
        1.0
    }
}

/// Log link: eta = ln(mu).
#[derive(Debug, Clone, Copy)]
pub struct LogLink;

impl LinkFunction for LogLink {
    fn link(&self, mu: f64) -> f64 {
        mu.ln()
    }

    fn inv_link(&self, eta: f64) -> f64 {
        eta.exp()
    }

    fn mu_eta(&self, eta: f64) -> f64 {
        eta.exp()
    }
}

/// Logit link: eta = ln(mu / (1 - mu)).
#[derive(Debug, Clone, Copy)]
pub struct LogitLink;

impl LinkFunction for LogitLink {
    fn link(&self, mu: f64) -> f64 {
        (mu / (1.0 - mu)).ln()
    }

    fn inv_link(&self, eta: f64) -> f64 {
        1.0 / (1.0 + (-eta).exp())
    }

    fn mu_eta(&self, eta: f64) -> f64 {
        let p = self.inv_link(eta);
        p * (1.0 - p)
    }
}

/// Inverse link: eta = 1 / mu.
#[derive(Debug, Clone, Copy)]
pub struct InverseLink;

impl LinkFunction for InverseLink {
    fn link(&self, mu: f64) -> f64 {
        1.0 / mu
    }

    fn inv_link(&self, eta: f64) -> f64 {
        1.0 / eta
    }

    fn mu_eta(&self, eta: f64) -> f64 {
        -1.0 / (eta * eta)
    }
}

/// Inverse-squared link: eta = 1 / mu^2.
#[derive(Debug, Clone, Copy)]
pub struct InverseSquaredLink;

impl LinkFunction for InverseSquaredLink {
    fn link(&self, mu: f64) -> f64 {
        1.0 / (mu * mu)
    }

    fn inv_link(&self, eta: f64) -> f64 {
        1.0 / eta.sqrt()
    }

    fn mu_eta(&self, eta: f64) -> f64 {
        -0.5 * eta.powf(-1.5)
    }
}

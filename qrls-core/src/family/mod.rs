//! GLM family transforms.
//!
//! Pure elementwise functions over `y`, `mu`, and optional prior weights:
//! variance, deviance residuals, and starting values for the mean. These
//! are consumed by a model-fitting driver alongside the least-squares
//! solver; they carry no shared state. A length-1 weight slice broadcasts
//! against vector-length arguments.

pub mod link;

use link::{
    IdentityLink, InverseLink, InverseSquaredLink, LinkFunction, LogLink, LogitLink,
};

/// A GLM family: determines the variance function, the deviance, and the
/// default link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Family {
    Gaussian,
    Poisson,
    Binomial,
    Gamma,
    InverseGaussian,
    /// Quasi-likelihood family with variance mu^power.
    Quasi { power: f64 },
}

/// Weight lookup with scalar broadcasting; absent weights are 1.
fn wt_at(wt: Option<&[f64]>, i: usize) -> f64 {
    match wt {
        None => 1.0,
        Some(w) if w.len() == 1 => w[0],
        Some(w) => w[i],
    }
}

/// y * ln(y / mu), taken as 0 when y is 0.
fn y_log_y(y: f64, mu: f64) -> f64 {
    if y > 0.0 { y * (y / mu).ln() } else { 0.0 }
}

impl Family {
    /// Canonical link for the family.
    pub fn default_link(&self) -> Box<dyn LinkFunction + Send + Sync> {
        match self {
            Family::Gaussian | Family::Quasi { .. } => Box::new(IdentityLink),
            Family::Poisson => Box::new(LogLink),
            Family::Binomial => Box::new(LogitLink),
            Family::Gamma => Box::new(InverseLink),
            Family::InverseGaussian => Box::new(InverseSquaredLink),
        }
    }

    /// Variance function V(mu), elementwise.
    pub fn variance(&self, mu: &[f64]) -> Vec<f64> {
        mu.iter()
            .map(|&m| match self {
                Family::Gaussian => 1.0,
                Family::Poisson => m,
                Family::Binomial => m * (1.0 - m),
                Family::Gamma => m * m,
                Family::InverseGaussian => m * m * m,
                Family::Quasi { power } => m.powf(*power),
            })
            .collect()
    }

    /// Starting values for the mean, given the response.
    pub fn initialize_mu(&self, y: &[f64]) -> Vec<f64> {
        match self {
            Family::Binomial => y.iter().map(|&yi| (yi + 0.5) / 2.0).collect(),
            Family::Poisson => y.iter().map(|&yi| yi + 0.1).collect(),
            Family::Gaussian
            | Family::Gamma
            | Family::InverseGaussian
            | Family::Quasi { .. } => y.to_vec(),
        }
    }

    /// Deviance residuals: sign(y - mu) * sqrt(d_i), with d_i the
    /// per-observation deviance contribution. Output has the length of
    /// `y`; `wt` may be a length-1 slice (broadcast) or match `y`.
    pub fn deviance_residuals(&self, y: &[f64], mu: &[f64], wt: Option<&[f64]>) -> Vec<f64> {
        assert_eq!(y.len(), mu.len());
        if let Some(w) = wt {
            assert!(w.len() == 1 || w.len() == y.len());
        }
        y.iter()
            .zip(mu.iter())
            .enumerate()
            .map(|(i, (&yi, &mi))| {
                let w = wt_at(wt, i);
                let d = match self {
                    Family::Gaussian => w * (yi - mi) * (yi - mi),
                    Family::Poisson => 2.0 * w * (y_log_y(yi, mi) - (yi - mi)),
                    Family::Binomial => {
                        2.0 * w * (y_log_y(yi, mi) + y_log_y(1.0 - yi, 1.0 - mi))
                    }
                    Family::Gamma => {
                        let r = if yi == 0.0 { 1.0 } else { yi / mi };
                        -2.0 * w * (r.ln() - (yi - mi) / mi)
                    }
                    Family::InverseGaussian => {
                        // No finite y = 0 limit exists here, unlike Gamma.
                        assert!(
                            yi > 0.0,
                            "inverse gaussian deviance requires positive y, got {yi}"
                        );
                        w * (yi - mi) * (yi - mi) / (yi * mi * mi)
                    }
                    Family::Quasi { power } => w * (yi - mi) * (yi - mi) / mi.powf(*power),
                };
                (yi - mi).signum() * d.max(0.0).sqrt()
            })
            .collect()
    }
}

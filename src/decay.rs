use crate::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

fn validate(rate: f32, vi: f32, vf: f32) -> Result<()> {
    let finite = rate.is_finite() && vi.is_finite() && vf.is_finite();
    (finite && ((rate >= 0.0 && vi >= vf) || (rate < 0.0 && vi <= vf)))
        .then_some(())
        .ok_or_else(|| Error::Config(String::from("`vi - vf` must have same sign as `rate`")))
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * e<sup>-rt</sup>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponential {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Exponential {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Exponential {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) * (-rate * t).exp()
    }
}

/// v(t) = max(v<sub>i</sub> - rt, v<sub>f</sub>)
///
/// Once `t` passes `(vi - vf) / r` the value sits at the floor for good.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Linear {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self> {
        if rate < 0.0 {
            return Err(Error::Config(String::from(
                "linear decay `rate` must not be negative",
            )));
        }
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        (vi - rate * t).max(vf)
    }
}

/// A decay strategy chosen at runtime, e.g. from a training configuration
#[derive(Debug, Clone, PartialEq)]
pub enum Schedule {
    Constant(Constant),
    Linear(Linear),
    Exponential(Exponential),
}

impl Decay for Schedule {
    fn evaluate(&self, t: f32) -> f32 {
        match self {
            Self::Constant(d) => d.evaluate(t),
            Self::Linear(d) => d.evaluate(t),
            Self::Exponential(d) => d.evaluate(t),
        }
    }
}

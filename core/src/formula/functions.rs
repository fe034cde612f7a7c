//! Built-in function table.
//!
//! Built once per process on first use. Names are stored lower-case and
//! looked up with the already-normalized identifier. Trigonometric functions
//! take and return degrees; the hyperbolic family works in plain radians.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub type UnaryFn = fn(f64) -> f64;
pub type BinaryFn = fn(f64, f64) -> f64;

/// Identifier that always denotes a fresh pseudorandom draw.
pub const RANDOM: &str = "random";

static REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::build);

pub struct FunctionRegistry {
    unary: HashMap<&'static str, UnaryFn>,
    binary: HashMap<&'static str, BinaryFn>,
}

impl FunctionRegistry {
    fn build() -> Self {
        let unary: [(&'static str, UnaryFn); 25] = [
            ("cos", |x| x.to_radians().cos()),
            ("sin", |x| x.to_radians().sin()),
            ("tan", |x| x.to_radians().tan()),
            ("acos", |x| x.acos().to_degrees()),
            ("asin", |x| x.asin().to_degrees()),
            ("atan", |x| x.atan().to_degrees()),
            ("cosh", f64::cosh),
            ("sinh", f64::sinh),
            ("tanh", f64::tanh),
            ("acosh", |x| (x + (x * x - 1.0).sqrt()).ln()),
            ("asinh", |x| (x + (x * x + 1.0).sqrt()).ln()),
            ("atanh", |x| 0.5 * ((1.0 + x) / (1.0 - x)).ln()),
            ("sqrt", f64::sqrt),
            ("sign", sign),
            ("round", round_half_up),
            ("trunc", f64::trunc),
            ("floor", f64::floor),
            ("ceil", f64::ceil),
            ("r2d", f64::to_degrees),
            ("d2r", f64::to_radians),
            ("exp", f64::exp),
            ("exp10", |x| 10f64.powf(x)),
            ("ln", f64::ln),
            ("log", f64::log10),
            ("abs", f64::abs),
        ];
        let binary: [(&'static str, BinaryFn); 3] = [
            ("pow", f64::powf),
            ("max", f64::max),
            ("min", f64::min),
        ];

        Self {
            unary: unary.into_iter().collect(),
            binary: binary.into_iter().collect(),
        }
    }

    pub fn unary(&self, name: &str) -> Option<UnaryFn> {
        self.unary.get(name).copied()
    }

    pub fn binary(&self, name: &str) -> Option<BinaryFn> {
        self.binary.get(name).copied()
    }
}

/// The process-wide table.
pub fn registry() -> &'static FunctionRegistry {
    &REGISTRY
}

/// Build the table eagerly, e.g. at host startup.
pub fn init() {
    Lazy::force(&REGISTRY);
}

/// `floor(x + 0.5)`: halves round up, also for negative inputs.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

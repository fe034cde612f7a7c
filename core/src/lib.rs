pub mod formula;
pub mod units;

pub fn version() -> &'static str {
    "0.1.0"
}

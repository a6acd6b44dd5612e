pub mod accuracy;
pub mod ball;
pub mod construction;
pub mod errors;
pub mod extension;
pub mod families;
pub mod generators;
pub mod genz_keister;
pub mod iterators;
pub mod polynomial;
pub mod roots;
pub mod rule;
pub mod serialization;
pub mod validation;
pub mod weight_factors;

pub use accuracy::{is_accurate_enough, AccuracyCriterion};
pub use ball::{CertifiedComplex, CertifiedReal};
pub use errors::GKError;
pub use families::{PolynomialFamily, PolynomialFamilyBackend};
pub use generators::GeneratorSequence;
pub use genz_keister::{build_rule, GenerationOptions, GenzKeister};
pub use rule::QuadratureRule;
pub use serialization::SerializationFormat;
pub use weight_factors::WeightFactorTable;

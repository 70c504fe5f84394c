pub mod gene_space;
pub mod initializer;

pub use gene_space::{format_key, parse_key, GeneDescriptor, GeneKind, GeneSpace, KEY_PRECISION};
pub use initializer::{initialize, stratified_values};

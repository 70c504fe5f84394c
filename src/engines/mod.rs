pub mod encoding;
pub mod evaluation;
pub mod generation;
pub mod genes;
pub mod search;

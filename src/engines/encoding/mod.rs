pub mod args;
pub mod registry;

pub use args::{build_args, EncoderArgs};
pub use registry::{EncoderFamily, EncoderRegistry};

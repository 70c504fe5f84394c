pub mod controller;

pub use controller::{SearchController, SearchState};

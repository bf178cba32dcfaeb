pub mod network;
pub mod params;

pub use network::Network;
pub use params::{LayerParams, NetworkParams};

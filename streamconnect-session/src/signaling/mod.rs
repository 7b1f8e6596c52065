mod signaling_client;

pub use signaling_client::SignalingClient;

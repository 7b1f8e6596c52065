mod relay_hub;

pub use relay_hub::{RelayHandle, RelayHub};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Opaque identifier of one upstream market symbol, eg/ "1HZ100V".
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct ChannelId(pub SmolStr);

impl ChannelId {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self(SmolStr::new(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ChannelId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

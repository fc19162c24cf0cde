use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Browser,
    FeedReader,
    MobileApp,
    Library,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::FeedReader => "feed reader",
            Self::MobileApp => "mobile app",
            Self::Library => "library",
        }
    }
}

impl Serialize for ClientType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

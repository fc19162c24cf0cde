use serde::Serialize;
use std::borrow::Cow;

/// Output of the bundled regex detector, serialized in the field layout
/// device-detector-js consumers expect (`client`, `os`, `device`, `bot`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Detection<'a> {
    pub client: Option<Client<'a>>,
    pub os: Option<Os<'a>>,
    pub device: Option<Device<'a>>,
    pub bot: Option<Bot<'a>>,
}

impl<'a> Detection<'a> {
    pub fn is_bot(&self) -> bool {
        self.bot.is_some()
    }
    pub fn bot(&self) -> Option<&Bot<'a>> {
        self.bot.as_ref()
    }
    pub fn os(&self) -> Option<&Os<'a>> {
        self.os.as_ref()
    }
    pub fn client(&self) -> Option<&Client<'a>> {
        self.client.as_ref()
    }
    pub fn device(&self) -> Option<&Device<'a>> {
        self.device.as_ref()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Bot<'a> {
    pub name: Cow<'a, str>,
    pub category: Option<&'a str>,
    pub url: Option<&'a str>,
    pub producer: Option<BotProducer<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotProducer<'a> {
    pub name: Option<&'a str>,
    pub url: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Os<'a> {
    pub name: Cow<'a, str>,
    pub version: Cow<'a, str>,
    pub platform: Cow<'a, str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client<'a> {
    #[serde(rename = "type")]
    pub kind: super::ClientType,
    pub name: Cow<'a, str>,
    pub version: Cow<'a, str>,
    pub engine: Cow<'a, str>,
    pub engine_version: Cow<'a, str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Device<'a> {
    #[serde(rename = "type")]
    pub kind: Option<super::DeviceType>,
    pub brand: Cow<'a, str>,
    pub model: Cow<'a, str>,
}

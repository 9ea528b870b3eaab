use serde::{Deserialize, Serialize};

use crate::converters;
use crate::marshal::{Queryable, Scope};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WlanStatus {
    pub enabled: bool,
    pub ssid: String,
    pub channel: u32,
}

impl Queryable for WlanStatus {
    fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
        scope.converter("switch", converters::bool);
        scope.converter("number", converters::uint);
        scope.field("wlan:settings/ap_enabled", Some("switch"), &mut self.enabled);
        scope.field("wlan:settings/ssid", None, &mut self.ssid);
        scope.field("wlan:settings/channel", Some("number"), &mut self.channel);
    }
}

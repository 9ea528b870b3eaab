// ── Device identity ──

use serde::{Deserialize, Serialize};

use crate::converters;
use crate::marshal::{Queryable, Scope};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxInfo {
    /// Marketing name, e.g. "FRITZ!Box 7590".
    pub product: String,
    pub firmware: String,
    pub uptime_secs: u64,
}

impl Queryable for BoxInfo {
    fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
        scope.converter("duration", converters::duration_secs);
        scope.field("env:info/product", None, &mut self.product);
        scope.field("logic:status/nspver", None, &mut self.firmware);
        scope.field("box:status/uptime", Some("duration"), &mut self.uptime_secs);
    }
}

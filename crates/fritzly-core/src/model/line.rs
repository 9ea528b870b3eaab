// ── Upstream line and internet connection ──

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::converters;
use crate::marshal::{Queryable, Scope};

/// DSL synchronisation state and negotiated line rates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DslStatus {
    /// Training state as reported by the modem, e.g. "SHOWTIME".
    pub link: String,
    pub downstream_bps: u64,
    pub upstream_bps: u64,
}

impl Queryable for DslStatus {
    fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
        scope.converter("rate", converters::kbit_to_bps);
        scope.field("sar:status/dsl_state", None, &mut self.link);
        scope.field("sar:status/dsl_ds_rate", Some("rate"), &mut self.downstream_bps);
        scope.field("sar:status/dsl_us_rate", Some("rate"), &mut self.upstream_bps);
    }
}

/// Internet connection on top of the line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WanStatus {
    /// Connection state, e.g. "5" for connected on most firmware.
    pub state: String,
    /// `None` while no address is assigned.
    pub external_ipv4: Option<Ipv4Addr>,
}

impl Queryable for WanStatus {
    fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
        scope.converter("address", converters::optional);
        scope.field("connection0:status/connect", None, &mut self.state);
        scope.field("connection0:status/ip", Some("address"), &mut self.external_ipv4);
    }
}

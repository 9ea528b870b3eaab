// ── Aggregated router status ──

use serde::{Deserialize, Serialize};

use super::{BoxInfo, DslStatus, WanStatus, WlanStatus};
use crate::marshal::{Queryable, Scope};

/// Everything `fritzly status` shows, fetched in a single query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStatus {
    pub device: BoxInfo,
    pub dsl: DslStatus,
    pub wan: WanStatus,
    pub wlan: WlanStatus,
}

impl Queryable for RouterStatus {
    fn describe<'a>(&'a mut self, scope: &mut Scope<'a>) {
        scope.propagate(&mut self.device);
        scope.propagate(&mut self.dsl);
        scope.propagate(&mut self.wan);
        scope.propagate(&mut self.wlan);
    }
}

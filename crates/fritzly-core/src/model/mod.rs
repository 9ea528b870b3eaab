// ── Domain status model ──
//
// Each type declares its own query commands and converters. `RouterStatus`
// pulls them all into one batched query through propagation.

pub mod box_info;
pub mod line;
pub mod status;
pub mod wlan;

pub use box_info::BoxInfo;
pub use line::{DslStatus, WanStatus};
pub use status::RouterStatus;
pub use wlan::WlanStatus;

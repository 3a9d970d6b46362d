/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

/// An appointment's date may no longer be changed once the current time is
/// within this many minutes of the existing scheduled time.
pub const RESCHEDULE_LOCKOUT_MINUTES: i64 = 60;

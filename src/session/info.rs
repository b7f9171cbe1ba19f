// ABOUTME: Device identity and health snapshot plus session traffic statistics

/// Counters of messages through this session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficStats {
    /// Messages read from the device and handed to the caller.
    pub total_in: u64,
    /// Message parts accepted by the device for sending.
    pub total_out: u64,
}

/// Information about the connected device, refreshed by
/// `refresh_device_info`.
///
/// Identity fields (manufacturer, model, serial number, IMSI, software
/// version) are fetched once and kept; battery, signal and GPRS state are
/// ephemeral and refreshed on every call.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial_no: String,
    pub imsi: String,
    pub sw_version: String,
    pub gprs_attached: bool,
    /// Battery charge, 0-100.
    pub battery_level: i32,
    /// Signal level rescaled to 0-100.
    pub signal_level: i32,
    pub stats: TrafficStats,
}

//! Per-device configuration consulted when recalling patches.

use crate::channel::MidiChannel;
use serde::{Deserialize, Serialize};

/// Hardware synth profile: valid patch range, bank select method and
/// default channel.
///
/// Read-only from the point of view of the MIDI subsystem; templates are
/// loaded and stored by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceTemplate {
    pub device_name: String,
    pub manufacturer: String,
    pub device_id: String,
    min_patch_number: u8,
    max_patch_number: u8,
    use_bank_select: bool,
    use_msb: bool,
    use_lsb: bool,
    default_channel: MidiChannel,
}

impl Default for DeviceTemplate {
    fn default() -> Self {
        Self::new("Generic", "Generic", "generic")
    }
}

impl DeviceTemplate {
    pub fn new(
        device_name: impl Into<String>,
        manufacturer: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            manufacturer: manufacturer.into(),
            device_id: device_id.into(),
            min_patch_number: 0,
            max_patch_number: 127,
            use_bank_select: false,
            use_msb: true,
            use_lsb: false,
            default_channel: MidiChannel::default(),
        }
    }

    pub fn generic() -> Self {
        Self::default()
    }

    /// MSB-only bank select.
    pub fn roland_jv1080() -> Self {
        Self::new("JV-1080", "Roland", "roland_jv1080").with_bank_select(true, true, false)
    }

    /// 32 voices, no bank select.
    pub fn yamaha_dx7() -> Self {
        Self::new("DX7", "Yamaha", "yamaha_dx7").with_patch_range(0, 31)
    }

    /// MSB and LSB bank select.
    pub fn korg_m1() -> Self {
        Self::new("M1", "Korg", "korg_m1").with_bank_select(true, true, true)
    }

    /// Both bounds are clamped to 0-127.
    pub fn with_patch_range(mut self, min: u8, max: u8) -> Self {
        self.min_patch_number = min.min(127);
        self.max_patch_number = max.min(127);
        self
    }

    pub fn with_bank_select(mut self, enabled: bool, msb: bool, lsb: bool) -> Self {
        self.use_bank_select = enabled;
        self.use_msb = msb;
        self.use_lsb = lsb;
        self
    }

    /// Clamped to 1-16.
    pub fn with_default_channel(mut self, channel: u8) -> Self {
        let clamped = channel.clamp(MidiChannel::MIN_DISPLAY, MidiChannel::MAX_DISPLAY);
        if let Ok(channel) = MidiChannel::from_display(clamped) {
            self.default_channel = channel;
        }
        self
    }

    #[inline]
    pub fn min_patch_number(&self) -> u8 {
        self.min_patch_number
    }

    #[inline]
    pub fn max_patch_number(&self) -> u8 {
        self.max_patch_number
    }

    #[inline]
    pub fn uses_bank_select(&self) -> bool {
        self.use_bank_select
    }

    #[inline]
    pub fn uses_msb(&self) -> bool {
        self.use_msb
    }

    #[inline]
    pub fn uses_lsb(&self) -> bool {
        self.use_lsb
    }

    #[inline]
    pub fn default_channel(&self) -> MidiChannel {
        self.default_channel
    }

    pub fn is_valid_patch_number(&self, patch: u8) -> bool {
        (self.min_patch_number..=self.max_patch_number).contains(&patch)
    }
}

//! Raw input event in the Linux input-subsystem shape.

/// Event type and code constants from `linux/input-event-codes.h`.
///
/// Only the values the mapper inspects or produces in tests are listed.
pub mod codes {
    pub const EV_SYN: u16 = 0x00;
    pub const EV_KEY: u16 = 0x01;
    pub const EV_ABS: u16 = 0x03;

    pub const SYN_REPORT: u16 = 0x00;

    pub const BTN_TOOL_PEN: u16 = 0x140;
    pub const BTN_TOUCH: u16 = 0x14a;
    pub const BTN_STYLUS: u16 = 0x14b;

    pub const ABS_X: u16 = 0x00;
    pub const ABS_Y: u16 = 0x01;
    pub const ABS_MT_POSITION_X: u16 = 0x35;
    pub const ABS_MT_POSITION_Y: u16 = 0x36;

    /// `EV_KEY` value for a release.
    pub const KEY_RELEASED: i32 = 0;
    /// `EV_KEY` value for a press.
    pub const KEY_PRESSED: i32 = 1;
    /// `EV_KEY` value for an autorepeat.
    pub const KEY_REPEAT: i32 = 2;
}

/// One event read from an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn new(event_type: u16, code: u16, value: i32) -> Self {
        Self {
            event_type,
            code,
            value,
        }
    }

    /// A key/button event (`EV_KEY`).
    pub fn key(code: u16, value: i32) -> Self {
        Self::new(codes::EV_KEY, code, value)
    }

    /// An absolute-axis event (`EV_ABS`).
    pub fn abs(code: u16, value: i32) -> Self {
        Self::new(codes::EV_ABS, code, value)
    }

    /// A `SYN_REPORT` frame separator.
    pub fn syn_report() -> Self {
        Self::new(codes::EV_SYN, codes::SYN_REPORT, 0)
    }
}

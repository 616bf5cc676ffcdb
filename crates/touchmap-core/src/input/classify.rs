//! Touch classifier: decides whether a raw event starts a contact.
//!
//! A touch-down is a key/button event whose code is one of the contact
//! buttons a touchscreen or pen tablet reports (finger contact, stylus
//! contact, pen tool in range) and whose value is "pressed".  Releases,
//! autorepeats, axis motion and synchronisation frames are all `Other`.

use super::event::{codes, RawEvent};

/// Button codes that signal the start of a contact.
pub const CONTACT_CODES: [u16; 3] = [codes::BTN_TOUCH, codes::BTN_STYLUS, codes::BTN_TOOL_PEN];

/// Result of classifying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchClass {
    TouchDown,
    Other,
}

impl TouchClass {
    pub fn is_touch_down(self) -> bool {
        self == TouchClass::TouchDown
    }
}

/// Classifies `event`.
pub fn classify(event: &RawEvent) -> TouchClass {
    if event.event_type == codes::EV_KEY
        && CONTACT_CODES.contains(&event.code)
        && event.value == codes::KEY_PRESSED
    {
        TouchClass::TouchDown
    } else {
        TouchClass::Other
    }
}

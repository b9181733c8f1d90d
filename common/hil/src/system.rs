// Licensed under the Apache-2.0 license

/// System reset controller.
pub trait SystemControl {
    /// Reset the device. On hardware this does not return; emulations record
    /// the request and return so that callers can be observed.
    fn reboot(&self);
}

//! Callbacks for service events.

use crate::controller::Controller;
use crate::service::LogSeverity;

/// Receives controller events. Every callback defaults to doing nothing.
///
/// Callbacks run on whichever task dispatches the event, so they should
/// return quickly.
pub trait Listener: Send + Sync {
    /// Registered with a controller.
    fn on_init(&self, _controller: &Controller) {}

    /// A device became available.
    fn on_connect(&self, _controller: &Controller) {}

    /// The device was lost.
    fn on_disconnect(&self, _controller: &Controller) {}

    /// The service became reachable.
    fn on_service_connect(&self, _controller: &Controller) {}

    /// The service went away.
    fn on_service_disconnect(&self, _controller: &Controller) {}

    /// A new frame is ready; read it with `controller.frame(0)`.
    fn on_frame(&self, _controller: &Controller) {}

    /// New images are ready.
    fn on_images(&self, _controller: &Controller) {}

    /// A device was attached or detached.
    fn on_device_change(&self, _controller: &Controller) {}

    /// A device failed to initialize.
    fn on_device_failure(&self, _controller: &Controller) {}

    /// Policy flags changed.
    fn on_policy_change(&self, _controller: &Controller) {}

    /// The service logged a message.
    fn on_log_message(&self, _controller: &Controller, _severity: LogSeverity, _timestamp_us: i64, _message: &str) {}

    /// Removed from its controller.
    fn on_exit(&self, _controller: &Controller) {}
}

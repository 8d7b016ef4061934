//! Client side of the `net.hadess.SensorProxy` interface.

use zbus::dbus_proxy;

#[dbus_proxy(
    interface = "net.hadess.SensorProxy",
    default_service = "net.hadess.SensorProxy",
    default_path = "/net/hadess/SensorProxy",
    gen_blocking = false
)]
trait SensorService {
    /// Ask the service to start reporting orientation for us.
    fn claim_accelerometer(&self) -> zbus::Result<()>;

    fn release_accelerometer(&self) -> zbus::Result<()>;

    #[dbus_proxy(property)]
    fn has_accelerometer(&self) -> zbus::Result<bool>;

    /// `undefined` until the first reading after a claim.
    #[dbus_proxy(property)]
    fn accelerometer_orientation(&self) -> zbus::Result<String>;
}

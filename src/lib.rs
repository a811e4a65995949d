//! rudder — browser automation over the WebDriver wire protocol.
//!
//! A client for WebDriver-compatible endpoints: a standalone remote server,
//! or a driver binary (geckodriver, chromedriver, ...) that the built-in
//! supervisor launches and tears down locally. One high-level API works
//! against both wire-protocol generations (the legacy JSON wire protocol
//! and the W3C standard); the generation is negotiated once per session and
//! every later command is translated through a static compatibility table.
//!
//! ```no_run
//! use rudder::{By, Capabilities, Driver, SupervisorConfig};
//!
//! # async fn run() -> rudder::Result<()> {
//! let driver = Driver::start(
//!     SupervisorConfig::default(),
//!     Capabilities::new().browser_name("firefox"),
//! )
//! .await?;
//!
//! driver.navigate("https://example.com").await?;
//! let body = driver.find_element(By::TagName, "body").await?;
//! body.click().await?;
//! driver.quit().await?;
//! # Ok(())
//! # }
//! ```

mod capabilities;
mod client;
mod driver;
mod element;
mod error;
mod protocol;
mod session;
mod supervisor;
mod transport;

pub use capabilities::Capabilities;
pub use driver::{Driver, Rect};
pub use element::{ClickStrategy, Element, Point, Size};
pub use error::{Result, RudderError};
pub use protocol::{Binding, By, Command, Protocol, TimeoutKind};
pub use session::Session;
pub use supervisor::{DriverSupervisor, RunningDriver, SupervisorConfig};
pub use transport::{WireResponse, WireTransport};

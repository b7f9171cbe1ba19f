//! Send and receive SMS messages by driving a GSM modem over a serial
//! AT-command link.
//!
//! Two tightly coupled cores carry the weight here:
//!
//! * The **TPDU codec** ([`pdu`]) - byte-exact encoding and decoding of
//!   3GPP TS 23.040 short messages: addresses, data coding schemes,
//!   user-data headers, concatenation, GSM 7-bit / 8-bit / UCS-2 payloads,
//!   status reports and service-centre timestamps.
//! * The **session controller** ([`session`]) - a state machine over a
//!   full-duplex serial line: connect, PIN/PUK authentication, network
//!   registration, synchronous or asynchronous receiving, sends with retry
//!   policy, a keep-alive pulse and reassembly of multipart messages
//!   arriving out of order.
//!
//! The raw serial port is not provided; implement [`SerialDriver`] over
//! whatever serial stack the target platform offers and hand it to
//! [`SmsSession`].
//!
//! ## Sending a message
//!
//! ```rust,no_run
//! use smsmodem::{OutgoingMessage, SessionConfig, SmsSession};
//! # async fn example(driver: impl smsmodem::SerialDriver) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new("Wavecom", "M1306B").with_sim_pin("0000");
//! let session = SmsSession::new(driver, config);
//! session.connect().await?;
//!
//! let mut message = OutgoingMessage::text("+447790123456", "Hello from Rust!");
//! session.send_message(&mut message).await?;
//! println!("sent, device reference {}", message.ref_no());
//!
//! session.disconnect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Receiving asynchronously
//!
//! ```rust,no_run
//! use smsmodem::{ReceiveMode, ReceivedMessage, SessionConfig, SmsSession};
//! # async fn example(driver: impl smsmodem::SerialDriver) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new("Huawei", "E160")
//!     .with_receive_mode(ReceiveMode::AsyncCmti);
//! let session = SmsSession::new(driver, config);
//! session.set_message_listener(Box::new(|message: &ReceivedMessage| {
//!     if let ReceivedMessage::Sms(sms) = message {
//!         println!("{}: {:?}", sms.originator, sms.text());
//!     }
//!     true // consume: delete from device memory
//! }));
//! session.connect().await?;
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod handler;
pub mod message;
mod multipart;
pub mod pdu;
pub mod response;
pub mod session;


pub use driver::{MonitorState, NewMessageMonitor, SerialDriver};
pub use handler::{HandlerError, Protocol, RetryPolicy, SendOutcome};
pub use message::{
    DeliveryStatus, IncomingMessage, MessageClass, OutgoingMessage, Payload, ReceivedMessage,
    StatusReport,
};
pub use pdu::{MessageEncoding, PduError};
pub use session::{
    DeviceInfo, MessageListener, ReceiveMode, RegistrationError, SessionConfig, SessionError,
    SessionResult, SmsSession, TrafficStats,
};

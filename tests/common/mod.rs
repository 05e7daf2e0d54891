#![allow(dead_code)]

pub mod mock_transport;

pub use mock_transport::MockTransport;

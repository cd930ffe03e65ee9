//! HTTP surfaces: the metadata and review record services, and the
//! aggregating movies service in front of them.

mod error;
pub mod info;
pub mod movies;
pub mod review;
pub mod sse;

use std::net::{Ipv4Addr, SocketAddr};

pub use error::ApiError;

/// Which HTTP surface a process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
	Info,
	Reviews,
	Movies,
}

impl Service {
	pub fn default_port(self) -> u16 {
		match self {
			Service::Info => 8080,
			Service::Reviews => 8081,
			Service::Movies => 8082,
		}
	}

	pub fn default_bind(self) -> SocketAddr {
		SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.default_port()))
	}
}

//! Session-aware HTTP API client: cookie-carried credentials, single-flight renewal, and
//! loop-free login redirects for every call site in one process.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod call;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod redirect;
pub mod session;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use crate::{
	call::{CallDescriptor, Method},
	config::ClientConfig,
	error::{Error, Result},
	http::{ApiResponse, ApiTransport},
	redirect::{Navigator, RecordingNavigator, RouteSource, SharedRoute},
	session::{AuthState, SessionClient},
};
#[cfg(feature = "reqwest")]
pub use crate::{http::ReqwestTransport, session::ReqwestSessionClient};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

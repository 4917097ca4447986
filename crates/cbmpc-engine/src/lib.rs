//! The native-engine ABI boundary (C7/§4.7, §9): opaque engine-resource
//! value types, the access-structure compiler, and the `Engine` trait
//! itself with its `mock` (default) and `link-native` backends.
//!
//! Nothing in the rest of this workspace talks to the engine except
//! through the [`Engine`] trait — `cbmpc-job` drives it per protocol
//! call, `cbmpc` builds the typed façades on top of that.

mod ac;
mod resource;
mod session;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
mod modmath;

#[cfg(feature = "link-native")]
pub mod sys;

pub use ac::AccessStructure;
pub use resource::{AccessStructureHandle, CurvePoint, Key, Scalar};
pub use session::{Engine, NativeSession, SessionCallbacks, SignerReceiver};

#[cfg(feature = "mock")]
pub use mock::MockEngine;

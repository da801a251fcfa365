//! Kubernetes integration of the gateway.
//!
//! Handlers depend on the [`ServiceApi`] trait and stay agnostic of the
//! transport; the default implementation, [`http::HttpServiceApi`], is
//! backed by the [`kube`] client built per invocation from the kubeconfig
//! secret. Keeping the abstraction in [`base`] lets tests substitute an
//! in-memory cluster.

mod base;
pub mod http;

pub use base::*;

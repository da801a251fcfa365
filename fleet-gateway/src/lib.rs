//! GitOps gateway handlers for the fleet control plane.
//!
//! Service specifications live as YAML files in a remote git repository (the
//! source of truth); a Kubernetes cluster follows them through the `Service`
//! custom resource. Each module under [`handlers`] implements one stateless,
//! single-shot operation — save or delete a spec file, list all specs, upsert
//! the cluster resource, or read cluster state — and builds every client it
//! needs from scratch, so nothing is shared between invocations.

pub mod authentication;
pub mod git;
pub mod handlers;
pub mod k8s;
pub mod service;

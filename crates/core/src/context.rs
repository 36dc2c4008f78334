//! Context fragments shared between steps
//!
//! A workflow's context is a plain struct composed of the fragments its
//! steps need. Each fragment comes with an accessor trait so steps can be
//! written against just the fragments they read or write:
//!
//! ```rust
//! use codelink_core::context::{Auth, AuthContext, Project, ProjectContext};
//!
//! #[derive(Default)]
//! struct LoginContext {
//!     auth: Auth,
//!     project: Project,
//! }
//!
//! impl AuthContext for LoginContext {
//!     fn auth(&self) -> &Auth { &self.auth }
//!     fn auth_mut(&mut self) -> &mut Auth { &mut self.auth }
//! }
//!
//! impl ProjectContext for LoginContext {
//!     fn project(&self) -> &Project { &self.project }
//!     fn project_mut(&mut self) -> &mut Project { &mut self.project }
//! }
//! ```
//!
//! Fields are `Option`s filled in by earlier steps; [`require`] turns a
//! missing one into an error naming the field.

use std::path::PathBuf;

use crate::configs::CodelinkConfig;
use crate::types::{CodelinkError, CodelinkResult};

/// Where an access token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Flag,
}

#[derive(Debug, Clone, Default)]
pub struct Auth {
    pub access_token: Option<String>,
    pub token_source: Option<TokenSource>,
}

pub trait AuthContext {
    fn auth(&self) -> &Auth;
    fn auth_mut(&mut self) -> &mut Auth;
}

#[derive(Debug, Clone, Default)]
pub struct Project {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub config: Option<CodelinkConfig>,
    pub git_root: Option<PathBuf>,
}

pub trait ProjectContext {
    fn project(&self) -> &Project;
    fn project_mut(&mut self) -> &mut Project;
}

/// The design file (and optionally one node in it) being linked
#[derive(Debug, Clone, Default)]
pub struct DesignFile {
    pub file_url: Option<String>,
    pub file_key: Option<String>,
    pub node_id: Option<String>,
}

pub trait DesignContext {
    fn design(&self) -> &DesignFile;
    fn design_mut(&mut self) -> &mut DesignFile;
}

/// Borrow a field an earlier step was expected to populate
pub fn require<'a, T>(value: &'a Option<T>, field: &'static str) -> CodelinkResult<&'a T> {
    value.as_ref().ok_or(CodelinkError::MissingContext(field))
}

//! spkg - Script Package Installer
//!
//! Reads packaging descriptors for script-based command-line utilities and
//! installs them locally: declared requirements are resolved against a local
//! package index, scripts are copied into a bin directory as executable entry
//! points, and the package name/version is registered in the index.

pub mod descriptor;
pub mod index;
pub mod install;
pub mod runtime;

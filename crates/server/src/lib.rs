//! Settings shared by the HTTP server and the console shell.

pub mod config;

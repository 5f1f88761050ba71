//! Demo route tree served by the `autoroute` binary.
//!
//! Each file registers itself with `route_module!`; discovery finds it by
//! walking `src/routes` from the working directory.

mod api;
mod health;
mod index;

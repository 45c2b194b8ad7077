//! Implementations of the [`Action`][action]s.
//!
//! Every action renders its result into a [`String`] so that it can be checked without capturing
//! `stdout`.
//!
//! [action]: crate::cli::Action

pub mod layout;
pub mod masks;
pub mod segments;

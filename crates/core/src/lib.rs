//! Core library for the newsletter service.
//!
//! Everything the service stores lives in one wide key-value table. This crate
//! defines the contract for that table: the [`item::Item`] trait every stored
//! entity implements (key derivation, type tag, counter keys, validation), the
//! [`storage::ItemStore`] trait the backends implement, the error taxonomy,
//! the change-feed record types, and the concrete [`subscription::Subscription`]
//! entity.

pub mod feed;
pub mod item;
pub mod storage;
pub mod subscription;

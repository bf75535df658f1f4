//! Warehouse stock ledger core for a repair-shop back office.
//!
//! The crate owns the rules by which a stock record's quantity or price may
//! change, the append-only transaction ledger that makes every such change
//! auditable, the two deletion modes (a reversible status flip and an
//! irreversible removal with a compensating ledger entry), and the calendar
//! boundary: dates are persisted in the Gregorian calendar and exclusively
//! read and written by users in the Jalali calendar.
//!
//! It is a library only: the GUI forms, report rendering, and lookup tables
//! of the surrounding application sit outside and talk to
//! [`services::WarehouseService`].

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod calendar;
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod lookup;
pub mod queries;
pub mod services;

pub use errors::ServiceError;

// src/services/mod.rs

//! Business operations, invoked by the web handlers. Each function takes the
//! resolved caller explicitly; identity is never re-derived down here.

pub mod chat;
pub mod checkout;
pub mod images;
pub mod login;
pub mod payment;

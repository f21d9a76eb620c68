pub mod checkout;
pub mod client;
pub mod galleries;
pub mod health;
pub mod upload;
pub mod webhook;

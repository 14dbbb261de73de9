//! Integration Tests Module
//!
//! Drives the assembled router end to end with in-process stores, against
//! an in-process echo router or a real upstream on a loopback port.

mod gateway_flow;

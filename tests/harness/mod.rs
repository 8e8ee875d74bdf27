// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for form-flood simulation.
//!
//! Simulates abusive submission patterns against the limiter on a manual
//! clock, so window boundaries are crossed without sleeping.

#![allow(dead_code)]

pub mod floods;
pub mod generators;
pub mod metrics;

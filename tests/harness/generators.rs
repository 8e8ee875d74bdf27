// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for flood simulation.

use inquiry_rate_limiter::validator::InquiryForm;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A well-formed contact submission.
pub fn contact_form(i: usize) -> InquiryForm {
    InquiryForm {
        name: Some(format!("Visitor {}", i)),
        email: Some(format!("visitor{}@example.com", i)),
        message: Some("Interested in a rooftop installation quote.".to_string()),
        ..Default::default()
    }
}

/// A submission that fails validation (no email).
pub fn junk_form(i: usize) -> InquiryForm {
    InquiryForm {
        name: Some(format!("bot-{}", i)),
        message: Some("buy cheap panels".to_string()),
        ..Default::default()
    }
}

/// Content-Type values for bypass testing.
pub fn generate_content_types() -> Vec<Option<&'static str>> {
    vec![
        // Valid
        Some("application/json"),
        Some("application/x-www-form-urlencoded; charset=utf-8"),
        // Invalid - should be rejected
        Some("text/plain"),
        Some("multipart/form-data"),
        Some("application/xml"),
        None,
    ]
}

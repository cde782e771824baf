// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Unit tests for `certificate.rs`

use crate::certificate::{CertificateInfo, Thumbprint};
use chrono::{Duration, Utc};

#[test]
fn test_thumbprint_hex_round_trip() {
    let tp = Thumbprint::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(tp.to_string(), "deadbeef");
    assert_eq!("deadbeef".parse::<Thumbprint>().unwrap(), tp);
}

#[test]
fn test_thumbprint_parse_is_case_insensitive() {
    let upper: Thumbprint = "DEADBEEF".parse().unwrap();
    let lower: Thumbprint = "deadbeef".parse().unwrap();
    assert_eq!(upper, lower);
}

#[test]
fn test_thumbprint_parse_ignores_whitespace() {
    let tp: Thumbprint = "de ad be ef".parse().unwrap();
    assert_eq!(tp.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn test_thumbprint_parse_rejects_garbage() {
    assert!("".parse::<Thumbprint>().is_err());
    assert!("abc".parse::<Thumbprint>().is_err()); // odd length
    assert!("zzzz".parse::<Thumbprint>().is_err());
}

#[test]
fn test_thumbprint_from_der_is_deterministic() {
    let a = Thumbprint::from_der(b"certificate bytes");
    let b = Thumbprint::from_der(b"certificate bytes");
    let c = Thumbprint::from_der(b"other bytes");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.as_bytes().len(), 32); // SHA-256
}

#[test]
fn test_thumbprint_serde_as_hex_string() {
    let tp = Thumbprint::from_bytes(vec![0x01, 0xff]);
    let json = serde_json::to_string(&tp).unwrap();
    assert_eq!(json, "\"01ff\"");
    let back: Thumbprint = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tp);
}

#[test]
fn test_certificate_info_expiry() {
    let mut cert = CertificateInfo::from_der(b"cert", "WebHosting");
    let now = Utc::now();
    assert!(!cert.expired_at(now)); // unknown validity is not expired

    cert.not_after = Some(now - Duration::days(1));
    assert!(cert.expired_at(now));

    cert.not_after = Some(now + Duration::days(30));
    assert!(!cert.expired_at(now));
}

#[test]
fn test_certificate_info_store_name() {
    let cert = CertificateInfo::new(Thumbprint::from_bytes(vec![1, 2, 3]), "My");
    assert_eq!(cert.store_name, "My");
    assert!(cert.friendly_name.is_none());
}

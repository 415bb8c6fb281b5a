//! Error code mapping and fatality classification.

use libprobe_core::errors::error_code;
use libprobe_core::{DetectionError, ProbeErrorCode};

#[test]
fn test_only_out_of_memory_is_fatal() {
    let oom = DetectionError::OutOfMemory {
        path: "lib/arm64-v8a/libx.so".into(),
        requested: 10,
        outstanding: 5,
        limit: 12,
    };
    assert!(oom.is_fatal());
    assert_eq!(oom.error_code(), error_code::OUT_OF_MEMORY);

    let too_big = DetectionError::SizeLimitExceeded {
        path: "lib/arm64-v8a/libx.so".into(),
        size: 100,
        limit: 10,
    };
    assert!(!too_big.is_fatal());
    assert_eq!(too_big.error_code(), error_code::SIZE_LIMIT_EXCEEDED);

    let evidence = DetectionError::evidence("libx.so", "not an ELF file");
    assert!(!evidence.is_fatal());
    assert_eq!(evidence.error_code(), error_code::EVIDENCE_UNAVAILABLE);
}

#[test]
fn test_messages_name_the_library() {
    let err = DetectionError::SizeLimitExceeded {
        path: "lib/x86_64/libbig.so".into(),
        size: 300,
        limit: 200,
    };
    let msg = err.to_string();
    assert!(msg.contains("lib/x86_64/libbig.so"));
    assert!(msg.contains("300"));
}

#[test]
fn test_io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: DetectionError = io.into();
    assert_eq!(err.error_code(), error_code::IO_ERROR);
}

use std::path::PathBuf;

use bytevm::exec::IntExecutor;
use bytevm::isa::v1::V1Decoder;
use bytevm::{CodeImage, Halt, LoadError, Machine, MachineConfig};

fn scratch(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("bytevm-{}-{name}.bin", std::process::id()));
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn loads_and_runs_a_binary_file() {
    // MOV R0, 7; ADD R0, 3; PRINT R0
    let bytes = [
        0x05, 0x00, 0x07, 0x01, //
        0x09, 0x00, 0x03, 0x01, //
        0x2E, 0x00, 0x00, 0x01,
    ];
    let path = scratch("ok", &bytes);
    let code = CodeImage::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(code.len_words(), 3);
    assert_eq!(code.as_bytes(), &bytes[..]);

    let mut m = Machine::new(code, MachineConfig::default());
    let mut out = Vec::new();
    let halt = m.run(&V1Decoder::new(), &IntExecutor, &mut out).unwrap();
    assert_eq!(halt, Halt::EndOfCode);
    assert_eq!(out, b"10\n");
}

#[test]
fn rejects_size_not_multiple_of_four() {
    let path = scratch("short", &[0x05, 0x00, 0x07, 0x01, 0x2E, 0x00]);
    let err = CodeImage::load(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, LoadError::Misaligned { len: 6 }));
    assert_eq!(err.to_string(), "code size 6 is not a multiple of 4 bytes");
}

#[test]
fn missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join("bytevm-definitely-missing-input.bin");
    let err = CodeImage::load(&path).unwrap_err();
    assert_eq!(err.to_string(), format!("cannot read {}", path.display()));
    match err {
        LoadError::Io { path: p, source } => {
            assert_eq!(p, path);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

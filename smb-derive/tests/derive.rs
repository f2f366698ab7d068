use num_enum::TryFromPrimitive;

use smb_core::{SMBByteSize, SMBFromBytes, SMBToBytes};
use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

#[derive(Debug, PartialEq, Eq, SMBByteSize, SMBFromBytes, SMBToBytes)]
#[smb_byte_tag(value = 24)]
struct CloseLike {
    #[smb_direct(start = 2)]
    flags: u16,
    #[smb_direct(start = 8)]
    persistent: u64,
    #[smb_direct(start = 16)]
    volatile: u64,
}

#[derive(Debug, PartialEq, Eq, SMBByteSize, SMBFromBytes, SMBToBytes)]
struct Untagged {
    #[smb_direct(start = 0)]
    low: u32,
    #[smb_direct(start = 4)]
    high: u32,
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, SMBByteSize, SMBFromBytes, SMBToBytes)]
enum Level {
    One = 1,
    Four = 4,
}

#[test]
fn tagged_struct_layout() {
    let value = CloseLike { flags: 1, persistent: 0x0102, volatile: u64::MAX };
    assert_eq!(value.smb_byte_size(), 24);
    let bytes = value.smb_to_bytes();
    assert_eq!(&bytes[0..4], &[24, 0, 1, 0]);
    assert_eq!(&bytes[4..8], &[0; 4]);
    assert_eq!(&bytes[8..10], &[0x02, 0x01]);
    assert_eq!(&bytes[16..24], &[0xFF; 8]);

    let mut input = bytes.clone();
    input.push(0xAB);
    let (remaining, parsed) = CloseLike::smb_from_bytes(&input).unwrap();
    assert_eq!(parsed, value);
    assert_eq!(remaining, &[0xAB]);
}

#[test]
fn wrong_tag_is_rejected() {
    let mut bytes = CloseLike { flags: 0, persistent: 0, volatile: 0 }.smb_to_bytes();
    bytes[0] = 25;
    assert!(CloseLike::smb_from_bytes(&bytes).is_err());
}

#[test]
fn truncated_struct_is_rejected() {
    assert!(Untagged::smb_from_bytes(&[1, 0, 0, 0, 2]).is_err());
    let (_, parsed) = Untagged::smb_from_bytes(&[1, 0, 0, 0, 2, 0, 0, 0]).unwrap();
    assert_eq!(parsed, Untagged { low: 1, high: 2 });
}

#[test]
fn repr_enum_uses_primitive() {
    assert_eq!(Level::Four.smb_byte_size(), 2);
    assert_eq!(Level::Four.smb_to_bytes(), vec![4, 0]);
    assert_eq!(Level::smb_from_bytes(&[1, 0]).unwrap().1, Level::One);
    assert!(Level::smb_from_bytes(&[2, 0]).is_err());
}
